//! Delivery events and observer hooks.
//!
//! The dispatch engine records only a coarse per-item status. Observers that
//! want per-destination detail (a CLI progress line, a test assertion, a
//! future delivery ledger) subscribe to the events defined here instead.
//!
//! ```text
//! ┌────────────┐  AttemptStarted / Succeeded / Failed  ┌───────────────────┐
//! │ Dispatcher │ ─────────────────────────────────────▶│ MulticastHandler  │
//! └────────────┘                                       └───────────────────┘
//!                                                        │            │
//!                                                        ▼            ▼
//!                                                    subscriber   subscriber
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContentId, DeliveryOutcome, WebhookId};

/// Events emitted by the dispatch engine, one sequence per webhook attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryEvent {
    /// Request to a webhook is about to be sent.
    AttemptStarted(AttemptStartedEvent),

    /// Webhook answered with a success status.
    Succeeded(DeliverySucceededEvent),

    /// Webhook rejected the item or could not be reached.
    Failed(DeliveryFailedEvent),
}

impl DeliveryEvent {
    /// Item the event refers to.
    pub fn content_id(&self) -> ContentId {
        match self {
            Self::AttemptStarted(event) => event.content_id,
            Self::Succeeded(event) => event.outcome.content_id,
            Self::Failed(event) => event.outcome.content_id,
        }
    }

    /// Webhook the event refers to.
    pub fn webhook_id(&self) -> WebhookId {
        match self {
            Self::AttemptStarted(event) => event.webhook_id,
            Self::Succeeded(event) => event.outcome.webhook_id,
            Self::Failed(event) => event.outcome.webhook_id,
        }
    }
}

/// Emitted before the HTTP request of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStartedEvent {
    /// Item being delivered.
    pub content_id: ContentId,
    /// Destination webhook.
    pub webhook_id: WebhookId,
    /// Destination URL.
    pub url: String,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
}

/// Emitted when a webhook accepts an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySucceededEvent {
    /// Per-webhook result.
    pub outcome: DeliveryOutcome,
    /// Destination URL.
    pub url: String,
    /// HTTP status returned by the webhook.
    pub response_status: u16,
    /// Round-trip time in milliseconds.
    pub duration_ms: u64,
}

/// Emitted when a delivery attempt fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailedEvent {
    /// Per-webhook result, with the error text set.
    pub outcome: DeliveryOutcome,
    /// Destination URL.
    pub url: String,
    /// HTTP status if the webhook answered at all.
    pub response_status: Option<u16>,
}

/// Trait for observing delivery events.
///
/// Handlers must not fail delivery: anything that goes wrong inside
/// `handle_event` is the handler's own business to log.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Handles a delivery event.
    async fn handle_event(&self, event: DeliveryEvent);
}

/// Event handler that discards all events.
#[derive(Debug, Default)]
pub struct NoOpEventHandler;

impl NoOpEventHandler {
    /// Creates a new no-op event handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EventHandler for NoOpEventHandler {
    async fn handle_event(&self, _event: DeliveryEvent) {}
}

/// Forwards every event to all registered subscribers concurrently.
#[derive(Debug, Clone, Default)]
pub struct MulticastEventHandler {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl MulticastEventHandler {
    /// Creates a multicast handler with no subscribers.
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Adds a subscriber.
    pub fn add_subscriber(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait::async_trait]
impl EventHandler for MulticastEventHandler {
    async fn handle_event(&self, event: DeliveryEvent) {
        let deliveries = self.handlers.iter().map(|handler| {
            let event = event.clone();
            async move { handler.handle_event(event).await }
        });

        futures::future::join_all(deliveries).await;
    }
}
