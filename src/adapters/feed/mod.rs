//! In-process change-notification feed.
//!
//! Broadcast-based implementation of the `ChangeFeed` port for sessions
//! sharing one process. The transport behind the port is swappable; the
//! reaction to a notice (full scoped reload) is not.

use tokio::sync::broadcast;

use crate::domain::ports::{ChangeFeed, ChangeNotice};

pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ChangeNotice>,
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of live subscriptions, for diagnostics.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed for BroadcastChangeFeed {
    fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.sender.subscribe()
    }

    fn publish(&self, notice: ChangeNotice) {
        // Send errors only mean there are no subscribers right now.
        let _ = self.sender.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ChangeTable;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_notices_reach_every_subscriber() {
        let feed = BroadcastChangeFeed::new(8);
        let mut rx_a = feed.subscribe();
        let mut rx_b = feed.subscribe();

        feed.publish(ChangeNotice {
            origin: Uuid::new_v4(),
            table: ChangeTable::Tracks,
            organization_id: None,
            track_id: Some(Uuid::new_v4()),
        });

        assert_eq!(rx_a.recv().await.unwrap().table, ChangeTable::Tracks);
        assert_eq!(rx_b.recv().await.unwrap().table, ChangeTable::Tracks);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let feed = BroadcastChangeFeed::new(8);
        feed.publish(ChangeNotice {
            origin: Uuid::new_v4(),
            table: ChangeTable::Votes,
            organization_id: None,
            track_id: None,
        });
        assert_eq!(feed.subscriber_count(), 0);
    }
}
