//! Workspace scope resolution.
//!
//! Produces the filter predicate and effective permission set every other
//! component runs under. Resolution fails closed: a caller that cannot be
//! resolved to a staff record gets an error (mapped to an empty result
//! set upstream), never an unfiltered view.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Permissions, ResolvedScope, ScopeFilter, SubsidiaryFilter, Workspace};
use crate::domain::ports::{OrgDirectory, StaffDirectory};

pub struct ScopeResolver {
    staff: Arc<dyn StaffDirectory>,
    orgs: Arc<dyn OrgDirectory>,
}

impl ScopeResolver {
    pub fn new(staff: Arc<dyn StaffDirectory>, orgs: Arc<dyn OrgDirectory>) -> Self {
        Self { staff, orgs }
    }

    /// Resolve the caller's identity plus a selected workspace into a
    /// scope filter and permission set.
    ///
    /// `None` workspace is valid only for system administrators, who get
    /// the unfiltered cross-tenant view through that explicit check.
    pub async fn resolve(
        &self,
        staff_id: Uuid,
        workspace: Option<&Workspace>,
    ) -> DomainResult<ResolvedScope> {
        let Some(identity) = self.staff.identity(staff_id).await? else {
            warn!(%staff_id, "scope resolution failed: unknown staff record");
            return Err(DomainError::ScopeResolutionFailed(format!(
                "no staff record for {staff_id}"
            )));
        };

        match workspace {
            None => {
                if identity.is_system_admin {
                    Ok(ResolvedScope {
                        staff_id: identity.staff_id,
                        filter: ScopeFilter::Unfiltered,
                        permissions: Permissions::all(),
                    })
                } else {
                    warn!(%staff_id, "scope resolution failed: no workspace selected");
                    Err(DomainError::ScopeResolutionFailed(
                        "no workspace selected".to_string(),
                    ))
                }
            }
            Some(Workspace::Personal { owner_id }) => {
                if *owner_id != identity.staff_id {
                    return Err(DomainError::forbidden("view another member's inbox"));
                }
                Ok(ResolvedScope {
                    staff_id: identity.staff_id,
                    filter: ScopeFilter::Personal { owner_id: *owner_id },
                    // The caller owns the inbox outright.
                    permissions: Permissions::all(),
                })
            }
            Some(Workspace::Organization { org_id, subsidiaries }) => {
                let Some(membership) = self.staff.membership(staff_id, *org_id).await? else {
                    return Err(DomainError::forbidden("operate in this organization"));
                };

                let expanded = self.orgs.expand_hierarchy(*org_id).await?;
                if expanded.is_empty() {
                    return Err(DomainError::OrganizationNotFound(*org_id));
                }

                let filter = match subsidiaries {
                    SubsidiaryFilter::All => ScopeFilter::Orgs(expanded),
                    SubsidiaryFilter::Only(sub_id) => {
                        if !expanded.contains(sub_id) {
                            warn!(%staff_id, %org_id, %sub_id, "selected sub-label outside hierarchy");
                            return Err(DomainError::ScopeResolutionFailed(format!(
                                "{sub_id} is not part of this organization"
                            )));
                        }
                        ScopeFilter::Orgs(vec![*sub_id])
                    }
                };

                Ok(ResolvedScope {
                    staff_id: identity.staff_id,
                    filter,
                    permissions: membership.permissions,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Identity, Membership, Organization, StaffCounts, StaffRole};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeDirectory {
        identities: HashMap<Uuid, Identity>,
        memberships: HashMap<(Uuid, Uuid), Membership>,
        hierarchies: HashMap<Uuid, Vec<Uuid>>,
    }

    #[async_trait]
    impl StaffDirectory for FakeDirectory {
        async fn identity(&self, staff_id: Uuid) -> DomainResult<Option<Identity>> {
            Ok(self.identities.get(&staff_id).copied())
        }

        async fn membership(&self, staff_id: Uuid, org_id: Uuid) -> DomainResult<Option<Membership>> {
            Ok(self.memberships.get(&(staff_id, org_id)).cloned())
        }
    }

    #[async_trait]
    impl OrgDirectory for FakeDirectory {
        async fn get(&self, org_id: Uuid) -> DomainResult<Option<Organization>> {
            Ok(self.hierarchies.get(&org_id).map(|_| Organization::new("fake")))
        }

        async fn expand_hierarchy(&self, org_id: Uuid) -> DomainResult<Vec<Uuid>> {
            Ok(self.hierarchies.get(&org_id).cloned().unwrap_or_default())
        }

        async fn staff_counts(&self, _org_id: Uuid) -> DomainResult<StaffCounts> {
            Ok(StaffCounts::default())
        }
    }

    fn setup() -> (Arc<FakeDirectory>, Uuid, Uuid, Uuid, Uuid) {
        let staff_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let sub_id = Uuid::new_v4();

        let mut identities = HashMap::new();
        identities.insert(staff_id, Identity { staff_id, is_system_admin: false });
        identities.insert(admin_id, Identity { staff_id: admin_id, is_system_admin: true });

        let mut memberships = HashMap::new();
        memberships.insert(
            (staff_id, org_id),
            Membership::new(staff_id, org_id, StaffRole::Manager),
        );

        let mut hierarchies = HashMap::new();
        hierarchies.insert(org_id, vec![org_id, sub_id]);

        (
            Arc::new(FakeDirectory { identities, memberships, hierarchies }),
            staff_id,
            admin_id,
            org_id,
            sub_id,
        )
    }

    fn resolver(dir: &Arc<FakeDirectory>) -> ScopeResolver {
        ScopeResolver::new(dir.clone(), dir.clone())
    }

    #[tokio::test]
    async fn test_unknown_staff_fails_closed() {
        let (dir, ..) = setup();
        let err = resolver(&dir)
            .resolve(Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ScopeResolutionFailed(_)));
    }

    #[tokio::test]
    async fn test_personal_workspace_grants_full_permissions() {
        let (dir, staff_id, ..) = setup();
        let scope = resolver(&dir)
            .resolve(staff_id, Some(&Workspace::Personal { owner_id: staff_id }))
            .await
            .unwrap();
        assert_eq!(scope.filter, ScopeFilter::Personal { owner_id: staff_id });
        assert_eq!(scope.permissions, Permissions::all());
    }

    #[tokio::test]
    async fn test_cannot_resolve_someone_elses_inbox() {
        let (dir, staff_id, ..) = setup();
        let err = resolver(&dir)
            .resolve(staff_id, Some(&Workspace::Personal { owner_id: Uuid::new_v4() }))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_org_all_expands_hierarchy() {
        let (dir, staff_id, _, org_id, sub_id) = setup();
        let scope = resolver(&dir)
            .resolve(
                staff_id,
                Some(&Workspace::Organization { org_id, subsidiaries: SubsidiaryFilter::All }),
            )
            .await
            .unwrap();
        assert_eq!(scope.filter, ScopeFilter::Orgs(vec![org_id, sub_id]));
    }

    #[tokio::test]
    async fn test_org_only_narrows_to_one_subsidiary() {
        let (dir, staff_id, _, org_id, sub_id) = setup();
        let scope = resolver(&dir)
            .resolve(
                staff_id,
                Some(&Workspace::Organization {
                    org_id,
                    subsidiaries: SubsidiaryFilter::Only(sub_id),
                }),
            )
            .await
            .unwrap();
        assert_eq!(scope.filter, ScopeFilter::Orgs(vec![sub_id]));
    }

    #[tokio::test]
    async fn test_foreign_subsidiary_fails_closed() {
        let (dir, staff_id, _, org_id, _) = setup();
        let err = resolver(&dir)
            .resolve(
                staff_id,
                Some(&Workspace::Organization {
                    org_id,
                    subsidiaries: SubsidiaryFilter::Only(Uuid::new_v4()),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ScopeResolutionFailed(_)));
    }

    #[tokio::test]
    async fn test_no_membership_is_forbidden() {
        let (dir, _, admin_id, org_id, _) = setup();
        // Admin has no membership in the org; selecting it is still forbidden.
        let err = resolver(&dir)
            .resolve(
                admin_id,
                Some(&Workspace::Organization { org_id, subsidiaries: SubsidiaryFilter::All }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_system_admin_bypass_requires_flag() {
        let (dir, staff_id, admin_id, ..) = setup();

        let scope = resolver(&dir).resolve(admin_id, None).await.unwrap();
        assert_eq!(scope.filter, ScopeFilter::Unfiltered);

        let err = resolver(&dir).resolve(staff_id, None).await.unwrap_err();
        assert!(matches!(err, DomainError::ScopeResolutionFailed(_)));
    }
}
