//! Business-logic services coordinating the domain over the ports.

pub mod fatigue;
pub mod pipeline;
pub mod release_sweep;
pub mod scope;
pub mod usage_limiter;
pub mod vote_ledger;

pub use fatigue::FatigueAnalyzer;
pub use pipeline::{NewTrack, PipelineEngine};
pub use release_sweep::ReleaseSweeper;
pub use scope::ScopeResolver;
pub use usage_limiter::UsageLimiter;
pub use vote_ledger::VoteLedger;
