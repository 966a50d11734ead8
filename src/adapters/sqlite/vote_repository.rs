//! SQLite implementation of the VoteRepository.
//!
//! Every vote write recomputes the owning track's `vote_total` inside
//! the same transaction, standing in for the authoritative store's
//! server-side aggregation.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Vote, VoteValue};
use crate::domain::ports::VoteRepository;

use super::track_repository::{parse_timestamp, parse_uuid};

#[derive(Clone)]
pub struct SqliteVoteRepository {
    pool: SqlitePool,
}

impl SqliteVoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepository {
    async fn get(&self, track_id: Uuid, voter_id: Uuid) -> DomainResult<Option<Vote>> {
        let row: Option<VoteRow> =
            sqlx::query_as("SELECT * FROM votes WHERE track_id = ? AND voter_id = ?")
                .bind(track_id.to_string())
                .bind(voter_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, vote: &Vote) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO votes (track_id, voter_id, organization_id, value, cast_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(vote.track_id.to_string())
        .bind(vote.voter_id.to_string())
        .bind(vote.organization_id.map(|id| id.to_string()))
        .bind(vote.value.as_i64())
        .bind(vote.cast_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        recompute_total(&mut tx, vote.track_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, track_id: Uuid, voter_id: Uuid) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM votes WHERE track_id = ? AND voter_id = ?")
            .bind(track_id.to_string())
            .bind(voter_id.to_string())
            .execute(&mut *tx)
            .await?;

        recompute_total(&mut tx, track_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn recomputed_total(&self, track_id: Uuid) -> DomainResult<i64> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(value), 0) FROM votes WHERE track_id = ?")
                .bind(track_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn list_for_track(&self, track_id: Uuid) -> DomainResult<Vec<Vote>> {
        let rows: Vec<VoteRow> = sqlx::query_as("SELECT * FROM votes WHERE track_id = ?")
            .bind(track_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

async fn recompute_total(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    track_id: Uuid,
) -> DomainResult<()> {
    sqlx::query(
        "UPDATE tracks SET vote_total = \
         (SELECT COALESCE(SUM(value), 0) FROM votes WHERE track_id = ?) WHERE id = ?",
    )
    .bind(track_id.to_string())
    .bind(track_id.to_string())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    track_id: String,
    voter_id: String,
    organization_id: Option<String>,
    value: i64,
    cast_at: String,
}

impl TryFrom<VoteRow> for Vote {
    type Error = DomainError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Vote {
            track_id: parse_uuid(&row.track_id)?,
            voter_id: parse_uuid(&row.voter_id)?,
            organization_id: row.organization_id.as_deref().map(parse_uuid).transpose()?,
            value: VoteValue::from_i64(row.value).ok_or_else(|| {
                DomainError::Serialization(format!("invalid vote value {}", row.value))
            })?,
            cast_at: parse_timestamp(&row.cast_at)?,
        })
    }
}
