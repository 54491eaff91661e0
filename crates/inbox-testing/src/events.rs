//! Recording event handler for asserting on delivery events.

use inbox_core::{ContentId, DeliveryEvent, EventHandler};
use tokio::sync::RwLock;

/// Stores every event it receives, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingEventHandler {
    events: RwLock<Vec<DeliveryEvent>>,
}

impl RecordingEventHandler {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far.
    pub async fn events(&self) -> Vec<DeliveryEvent> {
        self.events.read().await.clone()
    }

    /// Events concerning one content item.
    pub async fn events_for(&self, id: ContentId) -> Vec<DeliveryEvent> {
        self.events.read().await.iter().filter(|e| e.content_id() == id).cloned().collect()
    }

    /// Number of `Succeeded` events.
    pub async fn succeeded_count(&self) -> usize {
        self.count(|e| matches!(e, DeliveryEvent::Succeeded(_))).await
    }

    /// Number of `Failed` events.
    pub async fn failed_count(&self) -> usize {
        self.count(|e| matches!(e, DeliveryEvent::Failed(_))).await
    }

    /// Number of `AttemptStarted` events.
    pub async fn started_count(&self) -> usize {
        self.count(|e| matches!(e, DeliveryEvent::AttemptStarted(_))).await
    }

    /// Forgets everything recorded so far.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    async fn count(&self, predicate: impl Fn(&DeliveryEvent) -> bool) -> usize {
        self.events.read().await.iter().filter(|e| predicate(e)).count()
    }
}

#[async_trait::async_trait]
impl EventHandler for RecordingEventHandler {
    async fn handle_event(&self, event: DeliveryEvent) {
        self.events.write().await.push(event);
    }
}
