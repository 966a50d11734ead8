//! SQLite implementation of the staff/identity directory.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Identity, Membership, Permissions, StaffRole};
use crate::domain::ports::StaffDirectory;

use super::track_repository::parse_uuid;

#[derive(Clone)]
pub struct SqliteStaffDirectory {
    pool: SqlitePool,
}

impl SqliteStaffDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a staff record. Administrative surface, not part of the
    /// `StaffDirectory` port.
    pub async fn create_staff(
        &self,
        staff_id: Uuid,
        display_name: &str,
        is_system_admin: bool,
    ) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO staff (id, display_name, is_system_admin, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(staff_id.to_string())
        .bind(display_name)
        .bind(is_system_admin)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or replace a membership, permissions serialized as JSON.
    pub async fn upsert_membership(&self, membership: &Membership) -> DomainResult<()> {
        let permissions = serde_json::to_string(&membership.permissions)?;
        sqlx::query(
            r#"INSERT INTO memberships (staff_id, organization_id, role, permissions, active, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (staff_id, organization_id)
               DO UPDATE SET role = excluded.role, permissions = excluded.permissions,
                             active = excluded.active"#,
        )
        .bind(membership.staff_id.to_string())
        .bind(membership.organization_id.to_string())
        .bind(membership.role.as_str())
        .bind(permissions)
        .bind(membership.active)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StaffDirectory for SqliteStaffDirectory {
    async fn identity(&self, staff_id: Uuid) -> DomainResult<Option<Identity>> {
        let row: Option<(String, bool)> =
            sqlx::query_as("SELECT id, is_system_admin FROM staff WHERE id = ?")
                .bind(staff_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id, is_system_admin)) => Ok(Some(Identity {
                staff_id: parse_uuid(&id)?,
                is_system_admin,
            })),
            None => Ok(None),
        }
    }

    async fn membership(&self, staff_id: Uuid, org_id: Uuid) -> DomainResult<Option<Membership>> {
        let row: Option<MembershipRow> = sqlx::query_as(
            "SELECT * FROM memberships WHERE staff_id = ? AND organization_id = ?",
        )
        .bind(staff_id.to_string())
        .bind(org_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    staff_id: String,
    organization_id: String,
    role: String,
    permissions: String,
    active: bool,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let permissions: Permissions = serde_json::from_str(&row.permissions)?;
        Ok(Membership {
            staff_id: parse_uuid(&row.staff_id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            role: StaffRole::from_str(&row.role)
                .ok_or_else(|| DomainError::Serialization(format!("unknown role {}", row.role)))?,
            permissions,
            active: row.active,
        })
    }
}
