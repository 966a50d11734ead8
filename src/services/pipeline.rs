//! The review pipeline state machine.
//!
//! Sole writer of `Track.phase`. Tracks move strictly forward through
//! the fixed phase sequence; each hop is gated by permissions and by the
//! phase's own preconditions. Rejection archives a track in place,
//! preserving its phase for history.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Phase, ResolvedScope, ResourceClass, ScopeFilter, Track};
use crate::domain::ports::{OrgDirectory, TrackRepository};
use crate::services::usage_limiter::UsageLimiter;

/// Default reason recorded when an organization's policy does not
/// require one and the caller supplied none.
const REJECTION_PLACEHOLDER: &str = "No reason provided";

/// A track submission request.
#[derive(Debug, Clone, Default)]
pub struct NewTrack {
    pub title: String,
    pub artist_name: String,
    pub genre: Option<String>,
    pub bpm: Option<u16>,
    pub target_release_date: Option<NaiveDate>,
    /// Target organization when the scope spans several; defaults to the
    /// workspace root.
    pub organization_id: Option<Uuid>,
}

pub struct PipelineEngine {
    tracks: Arc<dyn TrackRepository>,
    orgs: Arc<dyn OrgDirectory>,
    limiter: Arc<UsageLimiter>,
}

impl PipelineEngine {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        orgs: Arc<dyn OrgDirectory>,
        limiter: Arc<UsageLimiter>,
    ) -> Self {
        Self { tracks, orgs, limiter }
    }

    /// Submit a new track into the inbox of the active workspace.
    pub async fn submit_track(&self, scope: &ResolvedScope, new: NewTrack) -> DomainResult<Track> {
        let mut track = match &scope.filter {
            ScopeFilter::Personal { owner_id } => {
                Track::submitted_to_inbox(new.title, new.artist_name, *owner_id)
            }
            ScopeFilter::Orgs(ids) => {
                let target = match new.organization_id {
                    Some(org) if ids.contains(&org) => org,
                    Some(org) => {
                        return Err(DomainError::ScopeResolutionFailed(format!(
                            "{org} is not part of the active workspace"
                        )))
                    }
                    None => *ids.first().ok_or_else(|| {
                        DomainError::ScopeResolutionFailed("empty organization scope".to_string())
                    })?,
                };
                self.limiter
                    .ensure_within_limit(Some(target), ResourceClass::Tracks)
                    .await?;
                Track::submitted_to_org(new.title, new.artist_name, target)
            }
            ScopeFilter::Unfiltered => {
                let target = new.organization_id.ok_or_else(|| {
                    DomainError::InvalidValue("an organization is required".to_string())
                })?;
                self.limiter
                    .ensure_within_limit(Some(target), ResourceClass::Tracks)
                    .await?;
                Track::submitted_to_org(new.title, new.artist_name, target)
            }
        };
        track.genre = new.genre;
        track.bpm = new.bpm;
        track.target_release_date = new.target_release_date;
        track.validate().map_err(DomainError::InvalidValue)?;

        self.tracks.insert(&track).await?;
        self.refetch(track.id).await
    }

    /// Advance a track one phase forward, enforcing the hop's gates.
    pub async fn advance(&self, scope: &ResolvedScope, track_id: Uuid) -> DomainResult<Track> {
        let mut track = self.visible(scope, track_id).await?;

        if track.archived {
            return Err(DomainError::AlreadyFinal);
        }
        let next = track.phase.next().ok_or(DomainError::AlreadyFinal)?;

        // Permission gate for the hop being attempted.
        match track.phase {
            Phase::Inbox if !scope.permissions.can_advance_lobby => {
                return Err(DomainError::forbidden("advance tracks out of the inbox"))
            }
            Phase::SecondListen if !scope.permissions.can_advance_office => {
                return Err(DomainError::forbidden("advance tracks into team review"))
            }
            Phase::Contracting if !scope.permissions.can_advance_contract => {
                return Err(DomainError::forbidden("schedule contracted tracks"))
            }
            _ => {}
        }

        // The team must have rated the track before the wider team
        // discusses it.
        if track.phase == Phase::SecondListen && track.energy == 0 {
            return Err(DomainError::EnergyRequired);
        }

        match next {
            Phase::SecondListen => {
                track.moved_to_second_listen_at = Some(Utc::now());
            }
            Phase::Upcoming => {
                if !track.contract_signed {
                    return Err(DomainError::ContractNotSigned);
                }
                // The commitment becomes the schedule at the moment
                // contracting completes; the target may still move until
                // then.
                track.release_date = track.target_release_date;
            }
            Phase::Vault => {
                self.limiter
                    .ensure_within_limit(track.organization_id, ResourceClass::VaultTracks)
                    .await?;
            }
            _ => {}
        }

        track.phase = next;
        self.tracks.update(&track).await?;
        debug!(%track_id, phase = next.as_str(), "track advanced");
        self.refetch(track_id).await
    }

    /// Reject a track: archive it in place, preserving its phase.
    pub async fn reject(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        reason: Option<String>,
    ) -> DomainResult<Track> {
        let mut track = self.visible(scope, track_id).await?;
        if track.archived {
            return Err(DomainError::AlreadyFinal);
        }

        let reason_required = match track.organization_id {
            Some(org_id) => self
                .orgs
                .get(org_id)
                .await?
                .ok_or(DomainError::OrganizationNotFound(org_id))?
                .require_rejection_reason,
            None => false,
        };

        let reason = match reason.filter(|r| !r.trim().is_empty()) {
            Some(reason) => reason,
            None if reason_required => return Err(DomainError::ReasonRequired),
            None => REJECTION_PLACEHOLDER.to_string(),
        };

        track.archived = true;
        track.rejection_reason = Some(reason);
        self.tracks.update(&track).await?;
        self.refetch(track_id).await
    }

    /// Rate a track's energy, 1-5.
    pub async fn set_energy(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        energy: u8,
    ) -> DomainResult<Track> {
        if !scope.permissions.can_set_energy {
            return Err(DomainError::forbidden("rate track energy"));
        }
        if !(1..=5).contains(&energy) {
            return Err(DomainError::InvalidValue(format!(
                "energy must be between 1 and 5, got {energy}"
            )));
        }
        let mut track = self.mutable(scope, track_id).await?;
        track.energy = energy;
        self.tracks.update(&track).await?;
        self.refetch(track_id).await
    }

    /// Record whether the release contract has been signed.
    pub async fn set_contract_signed(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        signed: bool,
    ) -> DomainResult<Track> {
        if !scope.permissions.can_advance_contract {
            return Err(DomainError::forbidden("update contract status"));
        }
        let mut track = self.mutable(scope, track_id).await?;
        track.contract_signed = signed;
        self.tracks.update(&track).await?;
        self.refetch(track_id).await
    }

    /// Move the negotiated release target. Locked once the track is
    /// scheduled, since the committed date was snapshotted then.
    pub async fn set_target_release_date(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        date: Option<NaiveDate>,
    ) -> DomainResult<Track> {
        if !scope.permissions.can_edit_release_date {
            return Err(DomainError::forbidden("edit release dates"));
        }
        let mut track = self.mutable(scope, track_id).await?;
        if track.phase >= Phase::Upcoming {
            return Err(DomainError::InvalidValue(
                "release target is locked once the track is scheduled".to_string(),
            ));
        }
        track.target_release_date = date;
        self.tracks.update(&track).await?;
        self.refetch(track_id).await
    }

    /// Toggle the caller's watch bookmark on a track.
    pub async fn set_watched(
        &self,
        scope: &ResolvedScope,
        track_id: Uuid,
        watched: bool,
    ) -> DomainResult<Track> {
        let mut track = self.mutable(scope, track_id).await?;
        track.watched = watched;
        self.tracks.update(&track).await?;
        self.refetch(track_id).await
    }

    /// Move every due release in the scope into the vault.
    ///
    /// The only autonomous transition in the system: scoped, idempotent,
    /// and tolerant of per-track failures (logged and skipped so one bad
    /// row cannot stall the sweep).
    pub async fn sweep_due_releases(
        &self,
        filter: &ScopeFilter,
        today: NaiveDate,
    ) -> DomainResult<usize> {
        let due = self.tracks.due_for_release(filter, today).await?;
        let mut moved = 0;

        for mut track in due {
            if let Err(err) = self
                .limiter
                .ensure_within_limit(track.organization_id, ResourceClass::VaultTracks)
                .await
            {
                warn!(track_id = %track.id, %err, "skipping due release");
                continue;
            }
            track.phase = Phase::Vault;
            if let Err(err) = self.tracks.update(&track).await {
                warn!(track_id = %track.id, %err, "failed to vault due release");
                continue;
            }
            moved += 1;
        }

        if moved > 0 {
            debug!(moved, "release sweep moved tracks to the vault");
        }
        Ok(moved)
    }

    async fn visible(&self, scope: &ResolvedScope, track_id: Uuid) -> DomainResult<Track> {
        self.tracks
            .get(track_id)
            .await?
            .filter(|t| scope.filter.matches(t))
            .ok_or(DomainError::TrackNotFound(track_id))
    }

    /// A visible track that still accepts mutation.
    async fn mutable(&self, scope: &ResolvedScope, track_id: Uuid) -> DomainResult<Track> {
        let track = self.visible(scope, track_id).await?;
        if track.is_final() {
            return Err(DomainError::AlreadyFinal);
        }
        Ok(track)
    }

    async fn refetch(&self, track_id: Uuid) -> DomainResult<Track> {
        self.tracks
            .get(track_id)
            .await?
            .ok_or(DomainError::TrackNotFound(track_id))
    }
}
