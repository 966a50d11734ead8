//! Port for remote-change notifications.
//!
//! The transport is abstract; the core's reaction to a notice is always
//! a full scoped reload, never an incremental patch.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Table a change notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTable {
    Tracks,
    Votes,
    ListenEvents,
    Memberships,
}

/// A notification that some session wrote a row.
#[derive(Debug, Clone)]
pub struct ChangeNotice {
    /// The session that performed the write; receivers skip their own.
    pub origin: Uuid,
    pub table: ChangeTable,
    /// Workspace the changed row belongs to; `None` for personal rows.
    pub organization_id: Option<Uuid>,
    pub track_id: Option<Uuid>,
}

/// Change-notification bus. Subscribing returns a receiver; dropping the
/// receiver (or aborting the task that reads it) is the unsubscribe.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ChangeNotice>;

    fn publish(&self, notice: ChangeNotice);
}
