//! SQLite implementation of the organization directory.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Organization, PlanLimits, StaffCounts};
use crate::domain::ports::OrgDirectory;

use super::track_repository::{parse_timestamp, parse_uuid};

#[derive(Clone)]
pub struct SqliteOrgDirectory {
    pool: SqlitePool,
}

impl SqliteOrgDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an organization. Administrative surface, not part of the
    /// `OrgDirectory` port.
    pub async fn create(&self, org: &Organization) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO organizations (id, name, parent_id, require_rejection_reason,
               max_tracks, max_contacts, max_staff, max_vault_tracks, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(org.id.to_string())
        .bind(&org.name)
        .bind(org.parent_id.map(|id| id.to_string()))
        .bind(org.require_rejection_reason)
        .bind(org.limits.max_tracks.map(|v| v as i64))
        .bind(org.limits.max_contacts.map(|v| v as i64))
        .bind(org.limits.max_staff.map(|v| v as i64))
        .bind(org.limits.max_vault_tracks.map(|v| v as i64))
        .bind(org.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrgDirectory for SqliteOrgDirectory {
    async fn get(&self, org_id: Uuid) -> DomainResult<Option<Organization>> {
        let row: Option<OrgRow> = sqlx::query_as("SELECT * FROM organizations WHERE id = ?")
            .bind(org_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn expand_hierarchy(&self, org_id: Uuid) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"WITH RECURSIVE descendants(id) AS (
                   SELECT id FROM organizations WHERE id = ?
                   UNION ALL
                   SELECT o.id FROM organizations o
                   JOIN descendants d ON o.parent_id = d.id
               )
               SELECT id FROM descendants"#,
        )
        .bind(org_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn staff_counts(&self, org_id: Uuid) -> DomainResult<StaffCounts> {
        let (total, active): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(active), 0) FROM memberships WHERE organization_id = ?",
        )
        .bind(org_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(StaffCounts { total: total as u64, active: active as u64 })
    }
}

#[derive(sqlx::FromRow)]
struct OrgRow {
    id: String,
    name: String,
    parent_id: Option<String>,
    require_rejection_reason: bool,
    max_tracks: Option<i64>,
    max_contacts: Option<i64>,
    max_staff: Option<i64>,
    max_vault_tracks: Option<i64>,
    created_at: String,
}

impl TryFrom<OrgRow> for Organization {
    type Error = DomainError;

    fn try_from(row: OrgRow) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: parse_uuid(&row.id)?,
            name: row.name,
            parent_id: row.parent_id.as_deref().map(parse_uuid).transpose()?,
            require_rejection_reason: row.require_rejection_reason,
            limits: PlanLimits {
                max_tracks: row.max_tracks.map(|v| v as u64),
                max_contacts: row.max_contacts.map(|v| v as u64),
                max_staff: row.max_staff.map(|v| v as u64),
                max_vault_tracks: row.max_vault_tracks.map(|v| v as u64),
            },
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
