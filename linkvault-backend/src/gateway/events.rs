//! Event broadcaster - fans task lifecycle events out to live subscribers
//!
//! A single broadcast channel feeds every connected stream; per-task
//! filtering happens at the subscriber. Dropping a receiver is all the
//! cleanup a disconnecting subscriber needs.

use tokio::sync::broadcast;

use super::protocol::GatewayEvent;

const CHANNEL_CAPACITY: usize = 256;

pub struct EventBroadcaster {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the live event feed.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    /// Broadcast an event to all connected subscribers. Events emitted while
    /// nobody is listening are dropped; the persisted state is the source of
    /// truth, the feed is only a live view.
    pub fn broadcast(&self, event: GatewayEvent) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        if let Err(e) = self.sender.send(event) {
            log::debug!("Dropped gateway event: {}", e);
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[tokio::test]
    async fn test_subscribers_receive_broadcasts() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let task = Task::new("quick_import", vec!["import".to_string()], Default::default());
        broadcaster.broadcast(GatewayEvent::task_created(&task));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "task.created");
        assert_eq!(event.task_id(), Some(task.id.as_str()));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_noop() {
        let broadcaster = EventBroadcaster::new();
        let task = Task::new("quick_import", vec![], Default::default());
        // must not panic or error
        broadcaster.broadcast(GatewayEvent::task_created(&task));
        assert_eq!(broadcaster.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_detaches() {
        let broadcaster = EventBroadcaster::new();
        let rx = broadcaster.subscribe();
        assert_eq!(broadcaster.receiver_count(), 1);
        drop(rx);
        assert_eq!(broadcaster.receiver_count(), 0);
    }
}
