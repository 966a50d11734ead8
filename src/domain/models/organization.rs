//! Organization (label) model and plan limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-plan resource ceilings. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlanLimits {
    pub max_tracks: Option<u64>,
    pub max_contacts: Option<u64>,
    pub max_staff: Option<u64>,
    pub max_vault_tracks: Option<u64>,
}

/// A label organization. Organizations form a tree via `parent_id`;
/// a workspace may view one node or the whole subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    /// Whether rejections must carry an explicit reason.
    pub require_rejection_reason: bool,
    pub limits: PlanLimits,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
            require_rejection_reason: false,
            limits: PlanLimits::default(),
            created_at: Utc::now(),
        }
    }

    pub fn subsidiary_of(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Staffing counts used by the company-health analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaffCounts {
    pub total: u64,
    pub active: u64,
}
