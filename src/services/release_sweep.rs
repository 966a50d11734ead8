//! Background release sweep.
//!
//! A fixed-interval heartbeat that vaults due releases in the active
//! workspace. Per-iteration errors are logged and swallowed so the timer
//! loop never dies; the returned task handle is aborted on teardown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::models::ScopeFilter;
use crate::services::pipeline::PipelineEngine;

pub struct ReleaseSweeper {
    pipeline: Arc<PipelineEngine>,
    interval: Duration,
}

impl ReleaseSweeper {
    pub fn new(pipeline: Arc<PipelineEngine>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// One sweep pass over a workspace. Idempotent: re-running with no
    /// intervening state change moves nothing.
    pub async fn run_once(&self, filter: &ScopeFilter) -> usize {
        match self
            .pipeline
            .sweep_due_releases(filter, Utc::now().date_naive())
            .await
        {
            Ok(moved) => moved,
            Err(err) => {
                warn!(%err, "release sweep iteration failed");
                0
            }
        }
    }

    /// Spawn the heartbeat loop. The sweep follows the workspace the
    /// session currently has active and idles while none is selected.
    pub fn spawn(self: Arc<Self>, scope_rx: watch::Receiver<Option<ScopeFilter>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so a fresh
            // session does not sweep before its first reload.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let filter = scope_rx.borrow().clone();
                if let Some(filter) = filter {
                    let moved = self.run_once(&filter).await;
                    debug!(moved, "release sweep heartbeat");
                }
            }
        })
    }
}
