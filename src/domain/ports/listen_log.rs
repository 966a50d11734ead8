//! Port for the append-only listen log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ListenEvent;

/// Append-only listen activity log.
#[async_trait]
pub trait ListenLog: Send + Sync {
    /// Record one listen fact
    async fn record(&self, event: &ListenEvent) -> DomainResult<()>;

    /// Listen count for one staff member since a point in time
    async fn count_for_staff(&self, staff_id: Uuid, since: DateTime<Utc>) -> DomainResult<u64>;

    /// Listen counts per staff member within one organization since a
    /// point in time. Drives the fatigued-staff census.
    async fn counts_by_staff(
        &self,
        organization_id: Uuid,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<(Uuid, u64)>>;
}
