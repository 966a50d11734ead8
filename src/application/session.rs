//! The review session: client-side synchronization coordinator.
//!
//! Owns the scoped track cache and its observables. Consistency comes
//! from three rules rather than any locking: the store recomputes
//! derived aggregates, every mutation reconciles by re-fetching the
//! affected entity, and an external change notification triggers a full
//! scoped reload instead of an incremental patch.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use backoff::ExponentialBackoff;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    HealthReport, ListenEvent, LoadReport, Phase, QuotaConfig, ResolvedScope, ScopeFilter,
    SweepConfig, SyncConfig, Track, UsageSnapshot, VoteRequest, Workspace,
};
use crate::domain::ports::{
    ChangeFeed, ChangeNotice, ChangeTable, ListFlags, ListenLog, TrackOrder, TrackRepository,
};
use crate::services::fatigue::FatigueAnalyzer;
use crate::services::pipeline::{NewTrack, PipelineEngine};
use crate::services::release_sweep::ReleaseSweeper;
use crate::services::scope::ScopeResolver;
use crate::services::usage_limiter::UsageLimiter;
use crate::services::vote_ledger::VoteLedger;

/// Everything a session needs, wired once at startup.
pub struct SessionDeps {
    pub resolver: ScopeResolver,
    pub pipeline: Arc<PipelineEngine>,
    pub ledger: Arc<VoteLedger>,
    pub fatigue: Arc<FatigueAnalyzer>,
    pub limiter: Arc<UsageLimiter>,
    pub tracks: Arc<dyn TrackRepository>,
    pub listens: Arc<dyn ListenLog>,
    pub feed: Arc<dyn ChangeFeed>,
}

struct ActiveScope {
    resolved: ResolvedScope,
    flags: ListFlags,
}

pub struct ReviewSession {
    /// Feed origin id; the session skips notices it published itself.
    id: Uuid,
    staff_id: Uuid,
    deps: SessionDeps,
    config: SyncConfig,
    scope: RwLock<Option<ActiveScope>>,
    /// Mirror of the active filter for background loops.
    scope_tx: watch::Sender<Option<ScopeFilter>>,
    tracks_tx: watch::Sender<Vec<Track>>,
    loading_tx: watch::Sender<bool>,
    usage_tx: watch::Sender<Option<UsageSnapshot>>,
    refresh_gate: DefaultDirectRateLimiter,
    feed_task: StdMutex<Option<JoinHandle<()>>>,
    background: StdMutex<Vec<JoinHandle<()>>>,
}

impl ReviewSession {
    pub fn new(staff_id: Uuid, deps: SessionDeps, config: SyncConfig) -> Arc<Self> {
        let cooldown = Duration::from_secs(config.focus_cooldown_secs.max(1));
        let quota =
            Quota::with_period(cooldown).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));

        Arc::new(Self {
            id: Uuid::new_v4(),
            staff_id,
            deps,
            config,
            scope: RwLock::new(None),
            scope_tx: watch::channel(None).0,
            tracks_tx: watch::channel(Vec::new()).0,
            loading_tx: watch::channel(false).0,
            usage_tx: watch::channel(None).0,
            refresh_gate: RateLimiter::direct(quota),
            feed_task: StdMutex::new(None),
            background: StdMutex::new(Vec::new()),
        })
    }

    /// Reactive view of the scoped track set.
    pub fn tracks(&self) -> watch::Receiver<Vec<Track>> {
        self.tracks_tx.subscribe()
    }

    /// Reactive in-flight indicator for scoped reloads.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    /// Reactive plan-usage snapshot for the active organization.
    pub fn usage(&self) -> watch::Receiver<Option<UsageSnapshot>> {
        self.usage_tx.subscribe()
    }

    /// Switch the active workspace.
    ///
    /// The previous change subscription is torn down before the new one
    /// is created, and all per-workspace derived state (hierarchy
    /// expansion, visibility flags, usage snapshot) is recomputed. A
    /// scope that fails to resolve fails closed: the cache empties.
    pub async fn switch_workspace(
        self: &Arc<Self>,
        workspace: Option<Workspace>,
    ) -> DomainResult<()> {
        if let Some(handle) = self.feed_task.lock().unwrap().take() {
            handle.abort();
        }

        let resolved = match self
            .deps
            .resolver
            .resolve(self.staff_id, workspace.as_ref())
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => {
                *self.scope.write().await = None;
                self.scope_tx.send_replace(None);
                self.tracks_tx.send_replace(Vec::new());
                self.usage_tx.send_replace(None);
                return Err(err);
            }
        };

        let flags = ListFlags {
            include_archived: resolved.permissions.can_access_archive,
            include_vault: resolved.permissions.can_access_vault,
        };
        let filter = resolved.filter.clone();
        *self.scope.write().await = Some(ActiveScope { resolved, flags });
        self.scope_tx.send_replace(Some(filter));

        self.subscribe_to_changes();
        self.refresh_usage().await;
        self.reload().await
    }

    /// Spawn the background loops: the release-sweep heartbeat and the
    /// periodic quota re-check. Both follow the active workspace and are
    /// aborted on [`close`](Self::close).
    pub fn spawn_background(self: &Arc<Self>, sweep: &SweepConfig, quota: &QuotaConfig) {
        let sweeper = Arc::new(ReleaseSweeper::new(
            self.deps.pipeline.clone(),
            Duration::from_secs(sweep.interval_secs),
        ));
        let sweep_handle = sweeper.spawn(self.scope_tx.subscribe());

        let weak = Arc::downgrade(self);
        let recheck = Duration::from_secs(quota.recheck_interval_secs);
        let quota_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(recheck);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(session) = weak.upgrade() else { break };
                session.refresh_usage().await;
            }
        });

        let mut background = self.background.lock().unwrap();
        background.push(sweep_handle);
        background.push(quota_handle);
    }

    /// Full scoped reload of the track cache.
    ///
    /// Transient store errors retry silently within the configured
    /// budget; an error that persists is surfaced.
    pub async fn reload(&self) -> DomainResult<()> {
        let Some((filter, flags)) = self.scope_view().await else {
            self.tracks_tx.send_replace(Vec::new());
            return Ok(());
        };

        self.loading_tx.send_replace(true);
        let result = self.list_with_retry(&filter, flags).await;
        self.loading_tx.send_replace(false);

        match result {
            Ok(tracks) => {
                self.tracks_tx.send_replace(tracks);
                Ok(())
            }
            Err(err) => {
                error!(%err, "scoped reload failed");
                Err(err)
            }
        }
    }

    /// Reload triggered by the view becoming active again. Throttled to
    /// at most one reload per cooldown window so rapid focus toggling
    /// cannot cause a refresh storm. Returns whether a reload ran.
    pub async fn refresh(&self) -> DomainResult<bool> {
        if self.refresh_gate.check().is_err() {
            debug!("focus refresh throttled");
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Advance a track one phase forward.
    pub async fn advance_track(&self, track_id: Uuid) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.pipeline.advance(&scope, track_id).await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Reject (archive) a track.
    pub async fn reject_track(&self, track_id: Uuid, reason: Option<String>) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.pipeline.reject(&scope, track_id, reason).await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Cast, change, or retract the caller's vote.
    pub async fn cast_vote(&self, track_id: Uuid, request: VoteRequest) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.ledger.cast_vote(&scope, track_id, request).await?;
        self.reconcile(&track).await;
        self.publish(ChangeTable::Votes, &track);
        Ok(track)
    }

    /// Rate a track's energy.
    pub async fn set_energy(&self, track_id: Uuid, energy: u8) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.pipeline.set_energy(&scope, track_id, energy).await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Record whether the release contract has been signed.
    pub async fn set_contract_signed(&self, track_id: Uuid, signed: bool) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self
            .deps
            .pipeline
            .set_contract_signed(&scope, track_id, signed)
            .await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Move the negotiated release target.
    pub async fn set_target_release_date(
        &self,
        track_id: Uuid,
        date: Option<chrono::NaiveDate>,
    ) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self
            .deps
            .pipeline
            .set_target_release_date(&scope, track_id, date)
            .await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Toggle the watch bookmark.
    pub async fn set_watched(&self, track_id: Uuid, watched: bool) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.pipeline.set_watched(&scope, track_id, watched).await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Submit a new track into the active workspace.
    pub async fn submit_track(&self, new: NewTrack) -> DomainResult<Track> {
        let scope = self.require_scope().await?;
        let track = self.deps.pipeline.submit_track(&scope, new).await?;
        self.after_track_mutation(&track).await;
        Ok(track)
    }

    /// Record that the caller listened to a track.
    pub async fn record_listen(&self, track_id: Uuid) -> DomainResult<()> {
        let scope = self.require_scope().await?;
        let track = self
            .deps
            .tracks
            .get(track_id)
            .await?
            .filter(|t| scope.filter.matches(t))
            .ok_or(DomainError::TrackNotFound(track_id))?;

        let event = ListenEvent::new(scope.staff_id, track_id, track.organization_id);
        self.deps.listens.record(&event).await?;
        self.publish(ChangeTable::ListenEvents, &track);
        Ok(())
    }

    /// Cognitive-load report for a staff member in the active workspace.
    pub async fn compute_load(&self, staff_id: Uuid) -> DomainResult<LoadReport> {
        let scope = self.require_scope().await?;
        self.deps.fatigue.compute_load(&scope, staff_id).await
    }

    /// Company-health report for an organization in the active workspace.
    pub async fn compute_health(&self, org_id: Uuid) -> DomainResult<HealthReport> {
        let scope = self.require_scope().await?;
        self.deps.fatigue.compute_health(&scope, org_id).await
    }

    /// Abort the change subscription and background loops.
    pub fn close(&self) {
        if let Some(handle) = self.feed_task.lock().unwrap().take() {
            handle.abort();
        }
        for handle in self.background.lock().unwrap().drain(..) {
            handle.abort();
        }
    }

    fn subscribe_to_changes(self: &Arc<Self>) {
        let mut rx = self.deps.feed.subscribe();
        let origin = self.id;
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notice) => {
                        if notice.origin == origin {
                            continue;
                        }
                        if !matches!(notice.table, ChangeTable::Tracks | ChangeTable::Votes) {
                            continue;
                        }
                        let Some(session) = weak.upgrade() else { break };
                        let relevant = session
                            .scope_view()
                            .await
                            .map_or(false, |(filter, _)| filter.covers_org(notice.organization_id));
                        if relevant {
                            if let Err(err) = session.reload().await {
                                error!(%err, "reload after change notification failed");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed notices collapse into the next full reload.
                        warn!(skipped, "change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        *self.feed_task.lock().unwrap() = Some(handle);
    }

    /// Reconcile the cache with a re-fetched entity, then notify other
    /// sessions.
    async fn after_track_mutation(&self, track: &Track) {
        self.reconcile(track).await;
        self.publish(ChangeTable::Tracks, track);
    }

    async fn reconcile(&self, track: &Track) {
        let Some((filter, flags)) = self.scope_view().await else {
            return;
        };
        self.tracks_tx.send_modify(|tracks| {
            tracks.retain(|t| t.id != track.id);
            let visible = filter.matches(track)
                && (flags.include_archived || !track.archived)
                && (flags.include_vault || track.phase != Phase::Vault);
            if visible {
                tracks.insert(0, track.clone());
            }
        });
    }

    fn publish(&self, table: ChangeTable, track: &Track) {
        self.deps.feed.publish(ChangeNotice {
            origin: self.id,
            table,
            organization_id: track.organization_id,
            track_id: Some(track.id),
        });
    }

    async fn refresh_usage(&self) {
        let org = self
            .scope
            .read()
            .await
            .as_ref()
            .and_then(|s| s.resolved.root_org());

        match org {
            Some(org_id) => match self.deps.limiter.snapshot(org_id).await {
                Ok(snapshot) => {
                    self.usage_tx.send_replace(Some(snapshot));
                }
                Err(err) => warn!(%err, "usage snapshot refresh failed"),
            },
            None => {
                self.usage_tx.send_replace(None);
            }
        }
    }

    async fn list_with_retry(
        &self,
        filter: &ScopeFilter,
        flags: ListFlags,
    ) -> DomainResult<Vec<Track>> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.config.read_retry_max_elapsed_secs)),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, || async move {
            self.deps
                .tracks
                .list(filter, TrackOrder::Newest, flags)
                .await
                .map_err(|err| {
                    if err.is_transient() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
        })
        .await
    }

    async fn scope_view(&self) -> Option<(ScopeFilter, ListFlags)> {
        self.scope
            .read()
            .await
            .as_ref()
            .map(|s| (s.resolved.filter.clone(), s.flags))
    }

    async fn require_scope(&self) -> DomainResult<ResolvedScope> {
        self.scope
            .read()
            .await
            .as_ref()
            .map(|s| s.resolved.clone())
            .ok_or_else(|| {
                DomainError::ScopeResolutionFailed("no active workspace".to_string())
            })
    }
}

impl Drop for ReviewSession {
    fn drop(&mut self) {
        self.close();
    }
}
