//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces the adapters implement:
//! - `TrackRepository` / `VoteRepository` / `ListenLog`: store operations
//! - `OrgDirectory` / `StaffDirectory`: tenant and identity lookups
//! - `UsageGate`: plan-limit checks
//! - `ChangeFeed`: cross-session change notifications
//!
//! These contracts keep the services independent of the backing store.

pub mod change_feed;
pub mod listen_log;
pub mod org_directory;
pub mod staff_directory;
pub mod track_repository;
pub mod usage_gate;
pub mod vote_repository;

pub use change_feed::{ChangeFeed, ChangeNotice, ChangeTable};
pub use listen_log::ListenLog;
pub use org_directory::OrgDirectory;
pub use staff_directory::StaffDirectory;
pub use track_repository::{ListFlags, TrackOrder, TrackRepository};
pub use usage_gate::UsageGate;
pub use vote_repository::VoteRepository;
