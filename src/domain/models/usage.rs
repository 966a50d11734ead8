//! Plan usage types for the quota limiter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource classes metered against an organization's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Tracks,
    Contacts,
    StaffMembers,
    VaultTracks,
}

impl ResourceClass {
    pub const ALL: [Self; 4] = [Self::Tracks, Self::Contacts, Self::StaffMembers, Self::VaultTracks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracks => "tracks",
            Self::Contacts => "contacts",
            Self::StaffMembers => "staff_members",
            Self::VaultTracks => "vault_tracks",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current consumption of one resource class. `limit` of `None` means
/// the plan does not meter the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub used: u64,
    pub limit: Option<u64>,
}

impl ResourceUsage {
    /// Whether one more unit fits under the limit.
    pub fn has_headroom(&self) -> bool {
        self.limit.map_or(true, |limit| self.used < limit)
    }
}

/// Point-in-time usage across all metered classes for one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub organization_id: Uuid,
    pub tracks: ResourceUsage,
    pub contacts: ResourceUsage,
    pub staff_members: ResourceUsage,
    pub vault_tracks: ResourceUsage,
    pub taken_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn usage(&self, class: ResourceClass) -> ResourceUsage {
        match class {
            ResourceClass::Tracks => self.tracks,
            ResourceClass::Contacts => self.contacts,
            ResourceClass::StaffMembers => self.staff_members,
            ResourceClass::VaultTracks => self.vault_tracks,
        }
    }
}
