//! Workspace and scope types.
//!
//! Every scope-dependent call takes the resolved scope as an explicit
//! parameter; there is no ambient "active workspace" global.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::membership::Permissions;
use super::track::Track;

/// Which subsidiaries of an organization workspace are in view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsidiaryFilter {
    /// The organization plus its full descendant hierarchy.
    All,
    /// A single organization from the hierarchy.
    Only(Uuid),
}

/// The tenant scope a session operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workspace {
    /// A staff member's private inbox.
    Personal { owner_id: Uuid },
    /// A label organization, possibly narrowed to one subsidiary.
    Organization {
        org_id: Uuid,
        subsidiaries: SubsidiaryFilter,
    },
}

/// Caller identity from the session provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub staff_id: Uuid,
    pub is_system_admin: bool,
}

/// The filter predicate every scoped query runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFilter {
    /// Personal-inbox tracks of one staff member.
    Personal { owner_id: Uuid },
    /// Tracks belonging to any of the listed organizations.
    Orgs(Vec<Uuid>),
    /// System-admin view across every tenant. Granted only through an
    /// explicit capability check, never as a default.
    Unfiltered,
}

impl ScopeFilter {
    /// Whether a track is visible under this filter.
    pub fn matches(&self, track: &Track) -> bool {
        match self {
            Self::Personal { owner_id } => {
                track.organization_id.is_none() && track.recipient_staff_id == Some(*owner_id)
            }
            Self::Orgs(ids) => track
                .organization_id
                .map_or(false, |org| ids.contains(&org)),
            Self::Unfiltered => true,
        }
    }

    /// Whether a change notice scoped to `organization_id` is relevant here.
    pub fn covers_org(&self, organization_id: Option<Uuid>) -> bool {
        match self {
            Self::Personal { .. } => organization_id.is_none(),
            Self::Orgs(ids) => organization_id.map_or(false, |org| ids.contains(&org)),
            Self::Unfiltered => true,
        }
    }

    /// Stable cache key. Analytics caches key per workspace so a hit is
    /// never served across a switch to a different organization.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Personal { owner_id } => format!("personal:{owner_id}"),
            Self::Orgs(ids) => {
                let mut sorted: Vec<String> = ids.iter().map(Uuid::to_string).collect();
                sorted.sort_unstable();
                format!("orgs:{}", sorted.join(","))
            }
            Self::Unfiltered => "unfiltered".to_string(),
        }
    }
}

/// Output of scope resolution: the filter predicate plus the caller's
/// effective permissions inside the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScope {
    pub staff_id: Uuid,
    pub filter: ScopeFilter,
    pub permissions: Permissions,
}

impl ResolvedScope {
    /// The organization an org-workspace scope is rooted at, if any.
    pub fn root_org(&self) -> Option<Uuid> {
        match &self.filter {
            ScopeFilter::Orgs(ids) => ids.first().copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::track::Track;

    #[test]
    fn test_personal_filter_matches_only_own_inbox() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let org = Uuid::new_v4();
        let filter = ScopeFilter::Personal { owner_id: owner };

        assert!(filter.matches(&Track::submitted_to_inbox("a", "b", owner)));
        assert!(!filter.matches(&Track::submitted_to_inbox("a", "b", other)));
        assert!(!filter.matches(&Track::submitted_to_org("a", "b", org)));
    }

    #[test]
    fn test_org_filter_never_matches_personal_tracks() {
        let org = Uuid::new_v4();
        let sub = Uuid::new_v4();
        let staff = Uuid::new_v4();
        let filter = ScopeFilter::Orgs(vec![org, sub]);

        assert!(filter.matches(&Track::submitted_to_org("a", "b", org)));
        assert!(filter.matches(&Track::submitted_to_org("a", "b", sub)));
        assert!(!filter.matches(&Track::submitted_to_org("a", "b", Uuid::new_v4())));
        assert!(!filter.matches(&Track::submitted_to_inbox("a", "b", staff)));
    }

    #[test]
    fn test_unfiltered_matches_everything() {
        let filter = ScopeFilter::Unfiltered;
        assert!(filter.matches(&Track::submitted_to_org("a", "b", Uuid::new_v4())));
        assert!(filter.matches(&Track::submitted_to_inbox("a", "b", Uuid::new_v4())));
    }

    #[test]
    fn test_cache_key_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            ScopeFilter::Orgs(vec![a, b]).cache_key(),
            ScopeFilter::Orgs(vec![b, a]).cache_key()
        );
        assert_ne!(
            ScopeFilter::Orgs(vec![a]).cache_key(),
            ScopeFilter::Orgs(vec![b]).cache_key()
        );
    }
}
