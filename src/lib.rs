//! Demodesk - Multi-tenant A&R Review Pipeline Core
//!
//! Demodesk is the core library of a record-label operations suite: the
//! track review pipeline staff push submitted demos through, gated by
//! role permissions and consensus voting, scoped to isolated workspaces
//! (personal inbox or label organization with subsidiary hierarchies),
//! with staff-fatigue analytics and a client-side cache kept loosely
//! consistent with the authoritative store.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business types, errors, and port contracts
//! - **Service Layer** (`services`): Business logic coordination over the ports
//! - **Application Layer** (`application`): The review session facade
//! - **Adapters** (`adapters`): SQLite store and in-process change feed
//! - **Infrastructure** (`infrastructure`): Configuration and logging setup
//!
//! # Example
//!
//! ```ignore
//! use demodesk::application::{ReviewSession, SessionDeps};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire adapters into SessionDeps, then drive a session.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{ReviewSession, SessionDeps};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, HealthReport, Identity, ListenEvent, LoadReport, LoadStatus, Membership, Organization,
    Permissions, Phase, ResourceClass, ScopeFilter, StaffRole, SubsidiaryFilter, Track,
    UsageSnapshot, Vote, VoteRequest, VoteValue, Workspace,
};
pub use domain::ports::{
    ChangeFeed, ChangeNotice, ChangeTable, ListenLog, ListFlags, OrgDirectory, StaffDirectory,
    TrackOrder, TrackRepository, UsageGate, VoteRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    FatigueAnalyzer, NewTrack, PipelineEngine, ReleaseSweeper, ScopeResolver, UsageLimiter,
    VoteLedger,
};
