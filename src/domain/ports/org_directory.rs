//! Port for organization lookups and hierarchy expansion.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Organization, StaffCounts};

/// Directory of label organizations.
#[async_trait]
pub trait OrgDirectory: Send + Sync {
    /// Fetch one organization
    async fn get(&self, org_id: Uuid) -> DomainResult<Option<Organization>>;

    /// An organization id expanded to itself plus every descendant
    /// subsidiary, in no particular order.
    async fn expand_hierarchy(&self, org_id: Uuid) -> DomainResult<Vec<Uuid>>;

    /// Total and active membership counts for one organization
    async fn staff_counts(&self, org_id: Uuid) -> DomainResult<StaffCounts>;
}
