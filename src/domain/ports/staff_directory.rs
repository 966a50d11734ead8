//! Port for identity and membership resolution.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Identity, Membership};

/// Identity/session provider surface. Scope resolution fails closed when
/// a caller cannot be resolved through this port.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Resolve a staff id to its identity record
    async fn identity(&self, staff_id: Uuid) -> DomainResult<Option<Identity>>;

    /// The caller's membership in one organization
    async fn membership(&self, staff_id: Uuid, org_id: Uuid) -> DomainResult<Option<Membership>>;
}
