//! The vote ledger: one active vote per (track, voter).
//!
//! Mutations follow change-then-refetch semantics: after any write the
//! track's authoritative state (including the store-recomputed
//! `vote_total`) and the full vote set are re-read and returned. The
//! aggregate is never derived by summing client-held votes; concurrent
//! voting is the one place server and client could diverge.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResolvedScope, Track, Vote, VoteRequest};
use crate::domain::ports::{TrackRepository, VoteRepository};

pub struct VoteLedger {
    tracks: Arc<dyn TrackRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl VoteLedger {
    pub fn new(tracks: Arc<dyn TrackRepository>, votes: Arc<dyn VoteRepository>) -> Self {
        Self { tracks, votes }
    }

    /// Cast, change, or retract the caller's vote on a track.
    ///
    /// Casting the same non-zero value twice is a no-op: the delete and
    /// re-insert cancel out and the aggregate is unchanged.
    pub async fn cast_vote(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        request: VoteRequest,
    ) -> DomainResult<Track> {
        if !scope.permissions.can_vote {
            return Err(DomainError::forbidden("vote on tracks"));
        }

        let track = self
            .tracks
            .get(track_id)
            .await?
            .filter(|t| scope.filter.matches(t))
            .ok_or(DomainError::TrackNotFound(track_id))?;
        if track.archived {
            return Err(DomainError::AlreadyFinal);
        }

        let voter_id = scope.staff_id;
        let current = self.votes.get(track_id, voter_id).await?;

        if current.is_some() {
            self.votes.delete(track_id, voter_id).await?;
        }

        if let Some(value) = request.value() {
            if current.as_ref().map(|v| v.value) != Some(value) {
                let vote = Vote::new(track_id, voter_id, track.organization_id, value);
                self.votes.insert(&vote).await?;
            }
        }

        self.refetch(track_id).await
    }

    /// Re-read the authoritative track state and overwrite the vote
    /// projection wholesale from the store.
    async fn refetch(&self, track_id: Uuid) -> DomainResult<Track> {
        let mut track = self
            .tracks
            .get(track_id)
            .await?
            .ok_or(DomainError::TrackNotFound(track_id))?;

        let votes = self.votes.list_for_track(track_id).await?;
        track.votes_by_voter = votes.into_iter().map(|v| (v.voter_id, v.value)).collect();
        track.vote_total = self.votes.recomputed_total(track_id).await?;
        Ok(track)
    }
}
