//! SQLite implementation of the TrackRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Phase, ScopeFilter, Track, VoteValue};
use crate::domain::ports::{ListFlags, TrackOrder, TrackRepository};

#[derive(Clone)]
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Populate the client-side vote projection for one track.
    async fn load_votes(&self, track: &mut Track) -> DomainResult<()> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT voter_id, value FROM votes WHERE track_id = ?")
                .bind(track.id.to_string())
                .fetch_all(&self.pool)
                .await?;

        let mut votes = HashMap::new();
        for (voter_id, value) in rows {
            let voter = parse_uuid(&voter_id)?;
            let value = VoteValue::from_i64(value)
                .ok_or_else(|| DomainError::Serialization(format!("invalid vote value {value}")))?;
            votes.insert(voter, value);
        }
        track.votes_by_voter = votes;
        Ok(())
    }

    fn scope_clause(filter: &ScopeFilter, sql: &mut String, bindings: &mut Vec<String>) {
        match filter {
            ScopeFilter::Personal { owner_id } => {
                sql.push_str(" AND organization_id IS NULL AND recipient_staff_id = ?");
                bindings.push(owner_id.to_string());
            }
            ScopeFilter::Orgs(ids) => {
                let placeholders = vec!["?"; ids.len().max(1)].join(", ");
                sql.push_str(&format!(" AND organization_id IN ({placeholders})"));
                if ids.is_empty() {
                    // An empty scope matches nothing; bind an impossible id.
                    bindings.push(Uuid::nil().to_string());
                } else {
                    bindings.extend(ids.iter().map(Uuid::to_string));
                }
            }
            ScopeFilter::Unfiltered => {}
        }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn insert(&self, track: &Track) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO tracks (id, title, artist_name, genre, bpm, energy, phase, archived,
               rejection_reason, vote_total, contract_signed, watched, total_earnings, spotify_plays,
               organization_id, recipient_staff_id, created_at, moved_to_second_listen_at,
               target_release_date, release_date)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(track.id.to_string())
        .bind(&track.title)
        .bind(&track.artist_name)
        .bind(&track.genre)
        .bind(track.bpm.map(i64::from))
        .bind(i64::from(track.energy))
        .bind(track.phase.as_str())
        .bind(track.archived)
        .bind(&track.rejection_reason)
        .bind(track.vote_total)
        .bind(track.contract_signed)
        .bind(track.watched)
        .bind(track.total_earnings)
        .bind(track.spotify_plays as i64)
        .bind(track.organization_id.map(|id| id.to_string()))
        .bind(track.recipient_staff_id.map(|id| id.to_string()))
        .bind(track.created_at.to_rfc3339())
        .bind(track.moved_to_second_listen_at.map(|t| t.to_rfc3339()))
        .bind(track.target_release_date.map(|d| d.to_string()))
        .bind(track.release_date.map(|d| d.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Track>> {
        let row: Option<TrackRow> = sqlx::query_as("SELECT * FROM tracks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut track: Track = row.try_into()?;
                self.load_votes(&mut track).await?;
                Ok(Some(track))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, track: &Track) -> DomainResult<()> {
        // Scope columns are immutable after creation and deliberately
        // absent from the update.
        let result = sqlx::query(
            r#"UPDATE tracks SET title = ?, artist_name = ?, genre = ?, bpm = ?, energy = ?,
               phase = ?, archived = ?, rejection_reason = ?, contract_signed = ?, watched = ?,
               total_earnings = ?, spotify_plays = ?, moved_to_second_listen_at = ?,
               target_release_date = ?, release_date = ?
               WHERE id = ?"#,
        )
        .bind(&track.title)
        .bind(&track.artist_name)
        .bind(&track.genre)
        .bind(track.bpm.map(i64::from))
        .bind(i64::from(track.energy))
        .bind(track.phase.as_str())
        .bind(track.archived)
        .bind(&track.rejection_reason)
        .bind(track.contract_signed)
        .bind(track.watched)
        .bind(track.total_earnings)
        .bind(track.spotify_plays as i64)
        .bind(track.moved_to_second_listen_at.map(|t| t.to_rfc3339()))
        .bind(track.target_release_date.map(|d| d.to_string()))
        .bind(track.release_date.map(|d| d.to_string()))
        .bind(track.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TrackNotFound(track.id));
        }

        Ok(())
    }

    async fn list(
        &self,
        filter: &ScopeFilter,
        order: TrackOrder,
        flags: ListFlags,
    ) -> DomainResult<Vec<Track>> {
        let mut sql = String::from("SELECT * FROM tracks WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        Self::scope_clause(filter, &mut sql, &mut bindings);
        if !flags.include_archived {
            sql.push_str(" AND archived = 0");
        }
        if !flags.include_vault {
            sql.push_str(" AND phase <> 'vault'");
        }

        sql.push_str(match order {
            TrackOrder::Newest => " ORDER BY created_at DESC",
            TrackOrder::Oldest => " ORDER BY created_at ASC",
            TrackOrder::TopVoted => " ORDER BY vote_total DESC, created_at DESC",
        });

        let mut query = sqlx::query_as::<_, TrackRow>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }

        let rows: Vec<TrackRow> = query.fetch_all(&self.pool).await?;
        let mut tracks = Vec::with_capacity(rows.len());
        for row in rows {
            let mut track: Track = row.try_into()?;
            self.load_votes(&mut track).await?;
            tracks.push(track);
        }
        Ok(tracks)
    }

    async fn count_created_since(
        &self,
        filter: &ScopeFilter,
        since: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM tracks WHERE created_at >= ?");
        let mut bindings = vec![since.to_rfc3339()];
        Self::scope_clause(filter, &mut sql, &mut bindings);

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }
        let (count,) = query.fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn due_for_release(
        &self,
        filter: &ScopeFilter,
        today: NaiveDate,
    ) -> DomainResult<Vec<Track>> {
        let mut sql = String::from(
            "SELECT * FROM tracks WHERE phase = 'upcoming' AND archived = 0 \
             AND release_date IS NOT NULL AND release_date <= ?",
        );
        let mut bindings = vec![today.to_string()];
        Self::scope_clause(filter, &mut sql, &mut bindings);
        sql.push_str(" ORDER BY release_date ASC");

        let mut query = sqlx::query_as::<_, TrackRow>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }

        let rows: Vec<TrackRow> = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TrackRow {
    id: String,
    title: String,
    artist_name: String,
    genre: Option<String>,
    bpm: Option<i64>,
    energy: i64,
    phase: String,
    archived: bool,
    rejection_reason: Option<String>,
    vote_total: i64,
    contract_signed: bool,
    watched: bool,
    total_earnings: f64,
    spotify_plays: i64,
    organization_id: Option<String>,
    recipient_staff_id: Option<String>,
    created_at: String,
    moved_to_second_listen_at: Option<String>,
    target_release_date: Option<String>,
    release_date: Option<String>,
}

impl TryFrom<TrackRow> for Track {
    type Error = DomainError;

    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(Track {
            id: parse_uuid(&row.id)?,
            title: row.title,
            artist_name: row.artist_name,
            genre: row.genre,
            bpm: row.bpm.map(|b| b as u16),
            energy: row.energy as u8,
            phase: Phase::from_str(&row.phase)
                .ok_or_else(|| DomainError::Serialization(format!("unknown phase {}", row.phase)))?,
            archived: row.archived,
            rejection_reason: row.rejection_reason,
            vote_total: row.vote_total,
            votes_by_voter: HashMap::new(),
            contract_signed: row.contract_signed,
            watched: row.watched,
            total_earnings: row.total_earnings,
            spotify_plays: row.spotify_plays as u64,
            organization_id: row.organization_id.as_deref().map(parse_uuid).transpose()?,
            recipient_staff_id: row.recipient_staff_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
            moved_to_second_listen_at: row
                .moved_to_second_listen_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            target_release_date: row.target_release_date.as_deref().map(parse_date).transpose()?,
            release_date: row.release_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(s).map_err(|e| DomainError::Serialization(format!("invalid uuid {s}: {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(format!("invalid timestamp {s}: {e}")))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DomainError::Serialization(format!("invalid date {s}: {e}")))
}
