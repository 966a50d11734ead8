//! Vote domain model.
//!
//! One signed opinion by one staff member on one track. At most one row
//! exists per (track, voter); retracting deletes the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed vote value at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Down,
    Up,
}

impl VoteValue {
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Down => -1,
            Self::Up => 1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Down),
            1 => Some(Self::Up),
            _ => None,
        }
    }
}

/// A vote mutation as requested by the caller. `Retract` deletes any
/// existing row instead of writing a zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRequest {
    Up,
    Down,
    Retract,
}

impl VoteRequest {
    /// The value to be written, or `None` for a retraction.
    pub fn value(&self) -> Option<VoteValue> {
        match self {
            Self::Up => Some(VoteValue::Up),
            Self::Down => Some(VoteValue::Down),
            Self::Retract => None,
        }
    }
}

/// A persisted vote row. The vote's scope always matches its track's
/// scope: same organization, or both personal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub track_id: Uuid,
    pub voter_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub value: VoteValue,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(track_id: Uuid, voter_id: Uuid, organization_id: Option<Uuid>, value: VoteValue) -> Self {
        Self {
            track_id,
            voter_id,
            organization_id,
            value,
            cast_at: Utc::now(),
        }
    }
}
