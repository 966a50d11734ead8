//! Port for plan-limit checks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ResourceClass, UsageSnapshot};

/// Pre-flight quota surface. The check-then-act pair is not atomic
/// across sessions; limits are soft under concurrent racing requests.
#[async_trait]
pub trait UsageGate: Send + Sync {
    /// Whether one more unit of the resource class fits under the
    /// organization's plan limit.
    async fn check(&self, org_id: Uuid, class: ResourceClass) -> DomainResult<bool>;

    /// Current consumption across all metered classes
    async fn usage_snapshot(&self, org_id: Uuid) -> DomainResult<UsageSnapshot>;
}
