//! Application layer: session-level coordination over the services.

pub mod session;

pub use session::{ReviewSession, SessionDeps};
