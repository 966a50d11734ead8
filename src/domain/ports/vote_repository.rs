//! Repository port for the vote ledger.
//!
//! The store is the single source of truth for `Track.vote_total`; it is
//! recomputed store-side on every insert and delete.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Vote;

/// Repository port for vote rows.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// The voter's current vote on a track, if any
    async fn get(&self, track_id: Uuid, voter_id: Uuid) -> DomainResult<Option<Vote>>;

    /// Insert a vote row and recompute the track's aggregate
    async fn insert(&self, vote: &Vote) -> DomainResult<()>;

    /// Delete a vote row and recompute the track's aggregate
    async fn delete(&self, track_id: Uuid, voter_id: Uuid) -> DomainResult<()>;

    /// The authoritative, freshly recomputed aggregate for a track
    async fn recomputed_total(&self, track_id: Uuid) -> DomainResult<i64>;

    /// All current vote rows for a track
    async fn list_for_track(&self, track_id: Uuid) -> DomainResult<Vec<Vote>>;
}
