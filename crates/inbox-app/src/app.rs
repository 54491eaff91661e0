//! Application facade wiring storage, registries, dispatcher and sweeper.
//!
//! This is the surface a front end drives: capture triggers, manual retry,
//! refresh sweeps, and webhook management through validated forms.

use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use inbox_core::{
    Clock, ContentId, ContentItem, ContentKind, ContentRegistry, EventHandler, KeyValueStore,
    MulticastEventHandler, RealClock, SqliteStore, UploadStatus, WebhookConfig, WebhookId,
    WebhookRegistry,
};
use inbox_delivery::{DispatchOutcome, Dispatcher, RetrySweeper, SweepReport, WebhookClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::Result,
    form::{validate_note, WebhookForm},
};

/// A newly captured item and the result of its first dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// Id of the stored item.
    pub id: ContentId,
    /// Result of dispatching it right after capture.
    pub outcome: DispatchOutcome,
}

/// The inbox relay with all of its parts wired together.
#[derive(Debug)]
pub struct InboxApp {
    store: Arc<dyn KeyValueStore>,
    content: Arc<ContentRegistry>,
    webhooks: Arc<WebhookRegistry>,
    dispatcher: Arc<Dispatcher>,
    sweeper: Arc<RetrySweeper>,
    sweep_interval: Duration,
}

impl InboxApp {
    /// Opens the SQLite store named in `config` and hydrates both registries.
    ///
    /// Every handler in `subscribers` receives each delivery event.
    pub async fn open(config: &Config, subscribers: Vec<Arc<dyn EventHandler>>) -> Result<Self> {
        let store = SqliteStore::open(&config.storage_path).await?;
        info!(path = %config.storage_path.display(), "inbox storage opened");

        Self::with_parts(Arc::new(store), Arc::new(RealClock::new()), subscribers, config).await
    }

    /// Builds the app on an injected store and clock.
    pub async fn with_parts(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        subscribers: Vec<Arc<dyn EventHandler>>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        let mut events = MulticastEventHandler::new();
        for subscriber in subscribers {
            events.add_subscriber(subscriber);
        }
        debug!(subscribers = events.subscriber_count(), "delivery event subscribers registered");

        let content = Arc::new(ContentRegistry::load(store.clone(), clock.clone()).await);
        let webhooks = Arc::new(WebhookRegistry::load(store.clone(), clock.clone()).await);
        let client = WebhookClient::new(config.to_client_config())?;

        let dispatcher = Arc::new(
            Dispatcher::new(content.clone(), webhooks.clone(), client, clock.clone())
                .with_event_handler(Arc::new(events))
                .with_device(config.device.clone()),
        );
        let sweeper =
            Arc::new(RetrySweeper::new(dispatcher.clone(), config.to_retry_policy(), clock));

        Ok(Self {
            store,
            content,
            webhooks,
            dispatcher,
            sweeper,
            sweep_interval: config.sweep_interval(),
        })
    }

    /// Stores a camera capture and dispatches it.
    pub async fn capture_photo(&self, bytes: &[u8], title: Option<&str>) -> Capture {
        self.capture(ContentKind::Photo, STANDARD.encode(bytes), title).await
    }

    /// Stores an image picked from the gallery and dispatches it.
    pub async fn pick_gallery_image(&self, bytes: &[u8], title: Option<&str>) -> Capture {
        self.capture(ContentKind::Gallery, STANDARD.encode(bytes), title).await
    }

    /// Stores a note and dispatches it. Blank notes are rejected.
    pub async fn save_note(&self, text: &str, title: Option<&str>) -> Result<Capture> {
        let text = validate_note(text)?;
        Ok(self.capture(ContentKind::Note, text, title).await)
    }

    /// Re-dispatches one item regardless of its retry count.
    pub async fn retry_item(&self, id: ContentId) -> DispatchOutcome {
        info!(content_id = %id, "manual retry requested");
        self.dispatcher.upload_to_all_webhooks(id).await
    }

    /// Pull-to-refresh: runs one retry sweep.
    pub async fn refresh(&self) -> SweepReport {
        self.sweeper.retry_failed_uploads().await
    }

    /// Screen mount: runs one retry sweep.
    pub async fn on_mount(&self) -> SweepReport {
        self.sweeper.retry_failed_uploads().await
    }

    /// Sweeps periodically until `cancellation_token` is cancelled.
    pub async fn run_sweeper(&self, cancellation_token: CancellationToken) {
        self.sweeper.run_periodic(self.sweep_interval, cancellation_token).await;
    }

    /// Validates `form` and registers a new, enabled webhook.
    pub async fn add_webhook(&self, form: WebhookForm) -> Result<WebhookId> {
        let valid = form.validate()?;
        Ok(self.webhooks.add_webhook(valid.name, valid.url, valid.headers, valid.categories).await)
    }

    /// Validates `form` and replaces the editable fields of a webhook.
    ///
    /// Returns `Ok(None)` if the id is unknown.
    pub async fn update_webhook(
        &self,
        id: WebhookId,
        form: WebhookForm,
    ) -> Result<Option<WebhookConfig>> {
        let valid = form.validate()?;
        Ok(self.webhooks.update_webhook(id, valid.into_update()).await)
    }

    /// Flips a webhook's enabled flag.
    pub async fn toggle_webhook(&self, id: WebhookId) -> Option<WebhookConfig> {
        self.webhooks.toggle_webhook(id).await
    }

    /// Removes a webhook.
    pub async fn delete_webhook(&self, id: WebhookId) -> Option<WebhookConfig> {
        self.webhooks.delete_webhook(id).await
    }

    /// All webhooks in insertion order.
    pub async fn webhooks(&self) -> Vec<WebhookConfig> {
        self.webhooks.webhooks().await
    }

    /// All items, most recent first.
    pub async fn items(&self) -> Vec<ContentItem> {
        self.content.items().await
    }

    /// Items whose last dispatch failed, most recent first.
    pub async fn failed_items(&self) -> Vec<ContentItem> {
        self.content
            .items()
            .await
            .into_iter()
            .filter(|item| item.upload_status == UploadStatus::Failed)
            .collect()
    }

    /// Looks up one item.
    pub async fn item(&self, id: ContentId) -> Option<ContentItem> {
        self.content.get(id).await
    }

    /// Removes one item.
    pub async fn delete_item(&self, id: ContentId) -> Option<ContentItem> {
        self.content.delete_item(id).await
    }

    /// Removes every item.
    pub async fn clear_items(&self) {
        self.content.clear_items().await;
    }

    /// Releases the backing store. The app must not be used afterwards.
    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Content registry.
    pub fn content(&self) -> &Arc<ContentRegistry> {
        &self.content
    }

    /// Dispatch engine.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Retry sweeper.
    pub fn sweeper(&self) -> &Arc<RetrySweeper> {
        &self.sweeper
    }

    async fn capture(
        &self,
        kind: ContentKind,
        data: impl Into<String>,
        title: Option<&str>,
    ) -> Capture {
        let title = title.map(str::trim).filter(|title| !title.is_empty()).map(str::to_string);
        let id = self.content.add_item(kind, data, title).await;
        let outcome = self.dispatcher.upload_to_all_webhooks(id).await;
        Capture { id, outcome }
    }
}
