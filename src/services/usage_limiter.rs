//! Pre-flight plan-limit checks.
//!
//! Gates track submission, contact creation, staff additions, and vault
//! entry. The check happens before the mutation and never alongside it,
//! so concurrent sessions can transiently overshoot a limit; that is an
//! accepted soft-limit property, not a bug.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResourceClass, UsageSnapshot};
use crate::domain::ports::UsageGate;

pub struct UsageLimiter {
    gate: Arc<dyn UsageGate>,
}

impl UsageLimiter {
    pub fn new(gate: Arc<dyn UsageGate>) -> Self {
        Self { gate }
    }

    /// Fail with `QuotaExceeded` unless one more unit of the resource
    /// class fits under the organization's plan. Personal workspaces
    /// (`org_id` of `None`) are unmetered.
    pub async fn ensure_within_limit(
        &self,
        org_id: Option<Uuid>,
        class: ResourceClass,
    ) -> DomainResult<()> {
        let Some(org_id) = org_id else {
            return Ok(());
        };
        if self.gate.check(org_id, class).await? {
            Ok(())
        } else {
            Err(DomainError::QuotaExceeded(class))
        }
    }

    /// Current consumption across all metered classes, for display.
    pub async fn snapshot(&self, org_id: Uuid) -> DomainResult<UsageSnapshot> {
        self.gate.usage_snapshot(org_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ResourceUsage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;

    struct FakeGate {
        exhausted: HashSet<ResourceClass>,
    }

    #[async_trait]
    impl UsageGate for FakeGate {
        async fn check(&self, _org_id: Uuid, class: ResourceClass) -> DomainResult<bool> {
            Ok(!self.exhausted.contains(&class))
        }

        async fn usage_snapshot(&self, org_id: Uuid) -> DomainResult<UsageSnapshot> {
            let usage = ResourceUsage { used: 0, limit: None };
            Ok(UsageSnapshot {
                organization_id: org_id,
                tracks: usage,
                contacts: usage,
                staff_members: usage,
                vault_tracks: usage,
                taken_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_exhausted_class_is_rejected() {
        let mut exhausted = HashSet::new();
        exhausted.insert(ResourceClass::Tracks);
        let limiter = UsageLimiter::new(Arc::new(FakeGate { exhausted }));
        let org = Uuid::new_v4();

        let err = limiter
            .ensure_within_limit(Some(org), ResourceClass::Tracks)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::QuotaExceeded(ResourceClass::Tracks)));

        limiter
            .ensure_within_limit(Some(org), ResourceClass::VaultTracks)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_personal_workspace_is_unmetered() {
        let exhausted: HashSet<_> = ResourceClass::ALL.into_iter().collect();
        let limiter = UsageLimiter::new(Arc::new(FakeGate { exhausted }));
        limiter
            .ensure_within_limit(None, ResourceClass::Tracks)
            .await
            .unwrap();
    }
}
