//! Staff membership and permission model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a staff member within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Owner,
    Manager,
    Scout,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Scout => "scout",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "manager" => Some(Self::Manager),
            "scout" => Some(Self::Scout),
            _ => None,
        }
    }

    /// Default capability set for the role. Stored per membership so an
    /// organization can customize individual grants afterwards.
    pub fn default_permissions(&self) -> Permissions {
        match self {
            Self::Owner | Self::Manager => Permissions::all(),
            Self::Scout => Permissions {
                can_vote: true,
                can_set_energy: true,
                can_advance_lobby: true,
                can_advance_office: false,
                can_advance_contract: false,
                can_access_archive: false,
                can_access_vault: false,
                can_edit_release_date: false,
                can_view_metrics: true,
            },
        }
    }
}

/// Fixed set of boolean capabilities attached to a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Permissions {
    #[serde(default)]
    pub can_vote: bool,
    #[serde(default)]
    pub can_set_energy: bool,
    #[serde(default)]
    pub can_advance_lobby: bool,
    #[serde(default)]
    pub can_advance_office: bool,
    #[serde(default)]
    pub can_advance_contract: bool,
    #[serde(default)]
    pub can_access_archive: bool,
    #[serde(default)]
    pub can_access_vault: bool,
    #[serde(default)]
    pub can_edit_release_date: bool,
    #[serde(default)]
    pub can_view_metrics: bool,
}

impl Permissions {
    /// Every capability granted. Used for Owners and for personal
    /// workspaces, where the caller owns the inbox outright.
    pub fn all() -> Self {
        Self {
            can_vote: true,
            can_set_energy: true,
            can_advance_lobby: true,
            can_advance_office: true,
            can_advance_contract: true,
            can_access_archive: true,
            can_access_vault: true,
            can_edit_release_date: true,
            can_view_metrics: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// A staff member's relationship to one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub staff_id: Uuid,
    pub organization_id: Uuid,
    pub role: StaffRole,
    pub permissions: Permissions,
    /// Inactive members are excluded from staffing analytics.
    pub active: bool,
}

impl Membership {
    pub fn new(staff_id: Uuid, organization_id: Uuid, role: StaffRole) -> Self {
        Self {
            staff_id,
            organization_id,
            role,
            permissions: role.default_permissions(),
            active: true,
        }
    }
}
