//! Track domain model.
//!
//! A track is a submitted demo under review. It moves forward through a
//! fixed sequence of phases and may be archived (rejected) from any of them.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vote::VoteValue;

/// Review phase of a track.
///
/// Phases are strictly ordered; a track only ever moves one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Freshly submitted, awaiting a first listen
    Inbox,
    /// Flagged for a closer second listen
    SecondListen,
    /// Under discussion by the wider team
    TeamReview,
    /// Contract negotiation in progress
    Contracting,
    /// Signed and scheduled for release
    Upcoming,
    /// Released; terminal
    Vault,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Inbox
    }
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::SecondListen => "second_listen",
            Self::TeamReview => "team_review",
            Self::Contracting => "contracting",
            Self::Upcoming => "upcoming",
            Self::Vault => "vault",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inbox" => Some(Self::Inbox),
            "second_listen" => Some(Self::SecondListen),
            "team_review" => Some(Self::TeamReview),
            "contracting" => Some(Self::Contracting),
            "upcoming" => Some(Self::Upcoming),
            "vault" => Some(Self::Vault),
            _ => None,
        }
    }

    /// The next phase in the pipeline, or `None` from the terminal phase.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Inbox => Some(Self::SecondListen),
            Self::SecondListen => Some(Self::TeamReview),
            Self::TeamReview => Some(Self::Contracting),
            Self::Contracting => Some(Self::Upcoming),
            Self::Upcoming => Some(Self::Vault),
            Self::Vault => None,
        }
    }

    /// Check if this is the terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Vault)
    }
}

/// A submitted demo moving through the review pipeline.
///
/// A track belongs to exactly one workspace: either an organization
/// (`organization_id` set) or a personal inbox (`recipient_staff_id` set).
/// Scope membership never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: Uuid,
    /// Track title
    pub title: String,
    /// Submitting artist
    pub artist_name: String,
    /// Genre tag
    pub genre: Option<String>,
    /// Beats per minute
    pub bpm: Option<u16>,
    /// Team energy rating, 1-5; 0 means unrated
    pub energy: u8,
    /// Current pipeline phase
    pub phase: Phase,
    /// Rejected/archived flag, orthogonal to phase
    pub archived: bool,
    /// Reason recorded when the track was rejected
    pub rejection_reason: Option<String>,
    /// Store-maintained vote sum; never written by clients
    pub vote_total: i64,
    /// Client-side projection of the current vote rows
    #[serde(default)]
    pub votes_by_voter: HashMap<Uuid, VoteValue>,
    /// Whether the release contract has been signed
    pub contract_signed: bool,
    /// Personal bookmark flag
    pub watched: bool,
    /// Lifetime earnings attributed to the track
    pub total_earnings: f64,
    /// Streaming play count
    pub spotify_plays: u64,
    /// Owning organization; `None` for personal-inbox tracks
    pub organization_id: Option<Uuid>,
    /// Personal inbox owner; set iff `organization_id` is `None`
    pub recipient_staff_id: Option<Uuid>,
    /// When submitted
    pub created_at: DateTime<Utc>,
    /// When it entered the second-listen phase
    pub moved_to_second_listen_at: Option<DateTime<Utc>>,
    /// Negotiated release target; may move while contracting
    pub target_release_date: Option<NaiveDate>,
    /// Committed schedule, snapshotted when contracting completes
    pub release_date: Option<NaiveDate>,
}

impl Track {
    /// Create a new track in the inbox of an organization workspace.
    pub fn submitted_to_org(
        title: impl Into<String>,
        artist_name: impl Into<String>,
        organization_id: Uuid,
    ) -> Self {
        Self::new_inner(title.into(), artist_name.into(), Some(organization_id), None)
    }

    /// Create a new track in a staff member's personal inbox.
    pub fn submitted_to_inbox(
        title: impl Into<String>,
        artist_name: impl Into<String>,
        recipient_staff_id: Uuid,
    ) -> Self {
        Self::new_inner(title.into(), artist_name.into(), None, Some(recipient_staff_id))
    }

    fn new_inner(
        title: String,
        artist_name: String,
        organization_id: Option<Uuid>,
        recipient_staff_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            artist_name,
            genre: None,
            bpm: None,
            energy: 0,
            phase: Phase::default(),
            archived: false,
            rejection_reason: None,
            vote_total: 0,
            votes_by_voter: HashMap::new(),
            contract_signed: false,
            watched: false,
            total_earnings: 0.0,
            spotify_plays: 0,
            organization_id,
            recipient_staff_id,
            created_at: Utc::now(),
            moved_to_second_listen_at: None,
            target_release_date: None,
            release_date: None,
        }
    }

    /// Set the genre tag.
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Set the BPM.
    pub fn with_bpm(mut self, bpm: u16) -> Self {
        self.bpm = Some(bpm);
        self
    }

    /// Set the negotiated release target.
    pub fn with_target_release_date(mut self, date: NaiveDate) -> Self {
        self.target_release_date = Some(date);
        self
    }

    /// Whether the track accepts further mutation. Archived tracks and
    /// tracks in the vault are final.
    pub fn is_final(&self) -> bool {
        self.archived || self.phase.is_terminal()
    }

    /// Validate scope consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("track title cannot be empty".to_string());
        }
        if self.artist_name.trim().is_empty() {
            return Err("artist name cannot be empty".to_string());
        }
        match (self.organization_id, self.recipient_staff_id) {
            (Some(_), Some(_)) => Err("track cannot belong to both an organization and a personal inbox".to_string()),
            (None, None) => Err("track must belong to an organization or a personal inbox".to_string()),
            _ => Ok(()),
        }
    }
}
