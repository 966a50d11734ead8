//! SQLite implementation of the plan-limit gate.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ResourceClass, ResourceUsage, UsageSnapshot};
use crate::domain::ports::UsageGate;

#[derive(Clone)]
pub struct SqliteUsageGate {
    pool: SqlitePool,
}

impl SqliteUsageGate {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a contact row; the contacts CRUD proper lives outside this
    /// core, but its quota class is metered here.
    pub async fn create_contact(&self, org_id: Uuid, name: &str) -> DomainResult<()> {
        sqlx::query("INSERT INTO contacts (id, organization_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(org_id.to_string())
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn usage(&self, org_id: Uuid, class: ResourceClass) -> DomainResult<ResourceUsage> {
        let (count_sql, limit_column) = match class {
            ResourceClass::Tracks => (
                "SELECT COUNT(*) FROM tracks WHERE organization_id = ?",
                "max_tracks",
            ),
            ResourceClass::Contacts => (
                "SELECT COUNT(*) FROM contacts WHERE organization_id = ?",
                "max_contacts",
            ),
            ResourceClass::StaffMembers => (
                "SELECT COUNT(*) FROM memberships WHERE organization_id = ?",
                "max_staff",
            ),
            ResourceClass::VaultTracks => (
                "SELECT COUNT(*) FROM tracks WHERE organization_id = ? AND phase = 'vault'",
                "max_vault_tracks",
            ),
        };

        let (used,): (i64,) = sqlx::query_as(count_sql)
            .bind(org_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        let limit: Option<(Option<i64>,)> =
            sqlx::query_as(&format!("SELECT {limit_column} FROM organizations WHERE id = ?"))
                .bind(org_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        let limit = limit
            .ok_or(DomainError::OrganizationNotFound(org_id))?
            .0
            .map(|v| v as u64);

        Ok(ResourceUsage { used: used as u64, limit })
    }
}

#[async_trait]
impl UsageGate for SqliteUsageGate {
    async fn check(&self, org_id: Uuid, class: ResourceClass) -> DomainResult<bool> {
        Ok(self.usage(org_id, class).await?.has_headroom())
    }

    async fn usage_snapshot(&self, org_id: Uuid) -> DomainResult<UsageSnapshot> {
        Ok(UsageSnapshot {
            organization_id: org_id,
            tracks: self.usage(org_id, ResourceClass::Tracks).await?,
            contacts: self.usage(org_id, ResourceClass::Contacts).await?,
            staff_members: self.usage(org_id, ResourceClass::StaffMembers).await?,
            vault_tracks: self.usage(org_id, ResourceClass::VaultTracks).await?,
            taken_at: Utc::now(),
        })
    }
}
