//! SQLite implementation of the append-only listen log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ListenEvent;
use crate::domain::ports::ListenLog;

use super::track_repository::parse_uuid;

#[derive(Clone)]
pub struct SqliteListenLog {
    pool: SqlitePool,
}

impl SqliteListenLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListenLog for SqliteListenLog {
    async fn record(&self, event: &ListenEvent) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO listen_events (id, staff_id, track_id, organization_id, listened_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(event.staff_id.to_string())
        .bind(event.track_id.to_string())
        .bind(event.organization_id.map(|id| id.to_string()))
        .bind(event.listened_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_for_staff(&self, staff_id: Uuid, since: DateTime<Utc>) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM listen_events WHERE staff_id = ? AND listened_at >= ?",
        )
        .bind(staff_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn counts_by_staff(
        &self,
        organization_id: Uuid,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<(Uuid, u64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT staff_id, COUNT(*) FROM listen_events \
             WHERE organization_id = ? AND listened_at >= ? GROUP BY staff_id",
        )
        .bind(organization_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(staff_id, count)| Ok((parse_uuid(&staff_id)?, count as u64)))
            .collect()
    }
}
