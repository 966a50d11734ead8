//! SQLite database migration management.

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError { version: i64, #[source] source: sqlx::Error },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
}

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_embedded_migrations(&self, migrations: Vec<Migration>) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let pending: Vec<_> = migrations.into_iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            return Ok(0);
        }

        for migration in &pending {
            self.apply_migration(migration).await?;
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let result: Option<(i64,)> = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_optional(&self.pool)
            .await
            .map_err(MigrationError::VersionCheckError)?;
        Ok(result.map(|(v,)| v).unwrap_or(0))
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        sqlx::raw_sql(&migration.sql)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::ExecutionError { version: migration.version, source: e })?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::ExecutionError { version: migration.version, source: e })?;
        Ok(())
    }
}

pub fn initial_schema_migration() -> Migration {
    Migration {
        version: 1,
        description: "Initial schema".to_string(),
        sql: r#"
            CREATE TABLE organizations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT REFERENCES organizations(id),
                require_rejection_reason INTEGER NOT NULL DEFAULT 0,
                max_tracks INTEGER,
                max_contacts INTEGER,
                max_staff INTEGER,
                max_vault_tracks INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE INDEX idx_organizations_parent ON organizations(parent_id);

            CREATE TABLE staff (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                is_system_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE memberships (
                staff_id TEXT NOT NULL REFERENCES staff(id),
                organization_id TEXT NOT NULL REFERENCES organizations(id),
                role TEXT NOT NULL,
                permissions TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                PRIMARY KEY (staff_id, organization_id)
            );

            CREATE TABLE tracks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist_name TEXT NOT NULL,
                genre TEXT,
                bpm INTEGER,
                energy INTEGER NOT NULL DEFAULT 0,
                phase TEXT NOT NULL DEFAULT 'inbox',
                archived INTEGER NOT NULL DEFAULT 0,
                rejection_reason TEXT,
                vote_total INTEGER NOT NULL DEFAULT 0,
                contract_signed INTEGER NOT NULL DEFAULT 0,
                watched INTEGER NOT NULL DEFAULT 0,
                total_earnings REAL NOT NULL DEFAULT 0,
                spotify_plays INTEGER NOT NULL DEFAULT 0,
                organization_id TEXT REFERENCES organizations(id),
                recipient_staff_id TEXT REFERENCES staff(id),
                created_at TEXT NOT NULL,
                moved_to_second_listen_at TEXT,
                target_release_date TEXT,
                release_date TEXT,
                CHECK ((organization_id IS NULL) <> (recipient_staff_id IS NULL))
            );

            CREATE INDEX idx_tracks_org_phase ON tracks(organization_id, phase);
            CREATE INDEX idx_tracks_recipient ON tracks(recipient_staff_id);
            CREATE INDEX idx_tracks_created ON tracks(created_at);

            CREATE TABLE votes (
                track_id TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
                voter_id TEXT NOT NULL REFERENCES staff(id),
                organization_id TEXT REFERENCES organizations(id),
                value INTEGER NOT NULL CHECK (value IN (-1, 1)),
                cast_at TEXT NOT NULL,
                PRIMARY KEY (track_id, voter_id)
            );

            CREATE TABLE listen_events (
                id TEXT PRIMARY KEY,
                staff_id TEXT NOT NULL REFERENCES staff(id),
                track_id TEXT NOT NULL REFERENCES tracks(id),
                organization_id TEXT REFERENCES organizations(id),
                listened_at TEXT NOT NULL
            );

            CREATE INDEX idx_listen_staff_time ON listen_events(staff_id, listened_at);
            CREATE INDEX idx_listen_org_time ON listen_events(organization_id, listened_at);

            CREATE TABLE contacts (
                id TEXT PRIMARY KEY,
                organization_id TEXT REFERENCES organizations(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX idx_contacts_org ON contacts(organization_id);
        "#
        .to_string(),
    }
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![initial_schema_migration()]
}
