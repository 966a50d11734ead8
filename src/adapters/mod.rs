//! Adapters implementing the domain ports.

pub mod feed;
pub mod sqlite;

pub use feed::BroadcastChangeFeed;
