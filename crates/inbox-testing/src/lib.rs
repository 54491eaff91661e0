//! Test infrastructure for the inbox webhook relay.
//!
//! [`TestEnv`] wires real registries, dispatcher and sweeper over an
//! in-memory store, a manually driven clock, a recording event handler and
//! a wiremock server standing in for webhook destinations.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use inbox_core::{
    ContentId, ContentItem, ContentRegistry, MemoryStore, UploadStatus, WebhookConfig, WebhookId,
    WebhookRegistry,
};
use inbox_delivery::{
    ClientConfig, DispatchOutcome, Dispatcher, RetryPolicy, RetrySweeper, WebhookClient,
};
use wiremock::MockServer;

pub mod events;
pub mod fixtures;
pub mod http;

pub use events::RecordingEventHandler;
pub use fixtures::{ContentBuilder, WebhookBuilder};
pub use inbox_core::{Clock, TestClock};

/// Device identifier used by every test dispatcher.
pub const TEST_DEVICE: &str = "test-device";

/// Complete in-process relay for integration tests.
pub struct TestEnv {
    /// Mock webhook destination
    pub http_mock: MockServer,
    /// Deterministic clock shared by every component
    pub clock: TestClock,
    /// Backing store, shared with the registries
    pub store: MemoryStore,
    /// Content registry
    pub content: Arc<ContentRegistry>,
    /// Webhook registry
    pub webhooks: Arc<WebhookRegistry>,
    /// Every delivery event emitted so far
    pub events: Arc<RecordingEventHandler>,
    /// Dispatch engine
    pub dispatcher: Arc<Dispatcher>,
    /// Retry sweeper with the default policy
    pub sweeper: Arc<RetrySweeper>,
}

impl TestEnv {
    /// Creates an environment with an empty store.
    pub async fn new() -> Result<Self> {
        Self::with_store(MemoryStore::new()).await
    }

    /// Creates an environment over an existing store, hydrating from it.
    pub async fn with_store(store: MemoryStore) -> Result<Self> {
        let http_mock = MockServer::start().await;
        let clock = TestClock::new();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

        let content =
            Arc::new(ContentRegistry::load(Arc::new(store.clone()), shared_clock.clone()).await);
        let webhooks =
            Arc::new(WebhookRegistry::load(Arc::new(store.clone()), shared_clock.clone()).await);
        let events = Arc::new(RecordingEventHandler::new());

        let client = WebhookClient::new(ClientConfig {
            timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        })?;
        let dispatcher = Arc::new(
            Dispatcher::new(content.clone(), webhooks.clone(), client, shared_clock.clone())
                .with_event_handler(events.clone())
                .with_device(TEST_DEVICE),
        );
        let sweeper =
            Arc::new(RetrySweeper::new(dispatcher.clone(), RetryPolicy::default(), shared_clock));

        Ok(Self { http_mock, clock, store, content, webhooks, events, dispatcher, sweeper })
    }

    /// Full URL of `path` on the mock server.
    pub fn webhook_url(&self, path: &str) -> String {
        format!("{}{}", self.http_mock.uri(), path)
    }

    /// Registers a webhook pointing at `path` on the mock server.
    pub async fn create_webhook(&self, path: &str, builder: WebhookBuilder) -> WebhookId {
        builder.url(self.webhook_url(path)).create(&self.webhooks).await
    }

    /// Captures an item and replays its configured history.
    pub async fn create_item(&self, builder: ContentBuilder) -> ContentId {
        builder.create(&self.content).await
    }

    /// Current state of an item. Panics if it is gone.
    pub async fn item(&self, id: ContentId) -> ContentItem {
        self.content.get(id).await.unwrap_or_else(|| panic!("content item {id} not found"))
    }

    /// Current state of a webhook. Panics if it is gone.
    pub async fn webhook(&self, id: WebhookId) -> WebhookConfig {
        self.webhooks.get(id).await.unwrap_or_else(|| panic!("webhook {id} not found"))
    }

    /// Dispatches an item to all of its webhooks.
    pub async fn dispatch(&self, id: ContentId) -> DispatchOutcome {
        self.dispatcher.upload_to_all_webhooks(id).await
    }

    /// Asserts an item's status and retry count.
    pub async fn assert_item(&self, id: ContentId, status: UploadStatus, retry_count: u32) {
        let item = self.item(id).await;
        assert_eq!(item.upload_status, status, "unexpected status for {id}");
        assert_eq!(item.retry_count, retry_count, "unexpected retry count for {id}");
    }
}
