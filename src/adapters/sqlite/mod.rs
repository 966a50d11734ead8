//! SQLite adapters implementing the store-facing ports.

pub mod connection;
pub mod listen_log;
pub mod migrations;
pub mod org_directory;
pub mod staff_directory;
pub mod track_repository;
pub mod usage_gate;
pub mod vote_repository;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use listen_log::SqliteListenLog;
pub use migrations::{all_embedded_migrations, initial_schema_migration, Migration, MigrationError, Migrator};
pub use org_directory::SqliteOrgDirectory;
pub use staff_directory::SqliteStaffDirectory;
pub use track_repository::SqliteTrackRepository;
pub use usage_gate::SqliteUsageGate;
pub use vote_repository::SqliteVoteRepository;
