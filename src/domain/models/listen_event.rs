//! Listen-activity log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable fact: one staff member played one track once. Never
/// mutated or deleted; consumed only by the fatigue analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenEvent {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub track_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub listened_at: DateTime<Utc>,
}

impl ListenEvent {
    pub fn new(staff_id: Uuid, track_id: Uuid, organization_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            staff_id,
            track_id,
            organization_id,
            listened_at: Utc::now(),
        }
    }
}
