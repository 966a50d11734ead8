//! Repository port for track persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ScopeFilter, Track};

/// Ordering for scoped track listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackOrder {
    /// Most recently submitted first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Highest vote total first
    TopVoted,
}

/// Visibility flags derived from the caller's permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFlags {
    pub include_archived: bool,
    pub include_vault: bool,
}

impl Default for ListFlags {
    fn default() -> Self {
        Self { include_archived: true, include_vault: true }
    }
}

/// Repository port for track persistence operations.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Insert a new track
    async fn insert(&self, track: &Track) -> DomainResult<()>;

    /// Get a track by id, with its vote projection populated
    async fn get(&self, id: Uuid) -> DomainResult<Option<Track>>;

    /// Update an existing track
    async fn update(&self, track: &Track) -> DomainResult<()>;

    /// List tracks visible under a scope filter
    async fn list(
        &self,
        filter: &ScopeFilter,
        order: TrackOrder,
        flags: ListFlags,
    ) -> DomainResult<Vec<Track>>;

    /// Count tracks submitted in a workspace since a point in time.
    /// The demand signal for fatigue analytics.
    async fn count_created_since(
        &self,
        filter: &ScopeFilter,
        since: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// Non-archived tracks in the upcoming phase whose committed release
    /// date is due on or before `today`.
    async fn due_for_release(
        &self,
        filter: &ScopeFilter,
        today: NaiveDate,
    ) -> DomainResult<Vec<Track>>;
}
