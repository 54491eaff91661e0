//! Dispatch engine: delivers one content item to every applicable webhook.
//!
//! A dispatch reads the item and the enabled webhooks, keeps those whose
//! categories accept the item's kind, and POSTs to all of them concurrently.
//! Every request settles before the outcome is aggregated:
//!
//! - at least one success: item becomes `success`
//! - every attempt failed: item becomes `failed` (retry count +1)
//! - no applicable webhook, or unknown item: nothing changes
//!
//! Per-webhook attempts only write the interim `uploading` status. The
//! terminal status is written once, by aggregation.

use std::sync::Arc;

use futures::future::join_all;
use inbox_core::{
    events::{AttemptStartedEvent, DeliveryFailedEvent, DeliverySucceededEvent},
    Clock, ContentId, ContentItem, ContentRegistry, DeliveryEvent, DeliveryOutcome, EventHandler,
    NoOpEventHandler, UploadStatus, WebhookConfig, WebhookRegistry,
};
use tracing::{debug, info, warn};

use crate::{
    client::{DeliveryRequest, DeliveryResponse, WebhookClient},
    error::{ErrorCategory, Result},
    payload::{prepare_data, ImageCompressor, PassthroughCompressor, UploadPayload},
};

/// What a dispatch did. Informational; dispatch never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The item id is unknown. Nothing was sent or written.
    ContentNotFound,
    /// No enabled webhook accepts the item's kind. Status left unchanged.
    NoApplicableWebhooks,
    /// At least one webhook accepted the item; status is `success`.
    Delivered {
        /// Webhooks that accepted the item
        succeeded: usize,
        /// Webhooks that rejected it or could not be reached
        failed: usize,
    },
    /// Every applicable webhook failed; status is `failed`.
    AllFailed {
        /// Number of webhooks attempted
        failed: usize,
    },
}

impl DispatchOutcome {
    /// Terminal status written by this dispatch, if any.
    pub fn final_status(&self) -> Option<UploadStatus> {
        match self {
            Self::Delivered { .. } => Some(UploadStatus::Success),
            Self::AllFailed { .. } => Some(UploadStatus::Failed),
            Self::ContentNotFound | Self::NoApplicableWebhooks => None,
        }
    }

    /// Number of HTTP requests issued.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Delivered { succeeded, failed } => succeeded + failed,
            Self::AllFailed { failed } => *failed,
            Self::ContentNotFound | Self::NoApplicableWebhooks => 0,
        }
    }
}

/// Delivers content items to their webhooks.
///
/// Holds no state of its own beyond collaborators: every dispatch works from
/// the registries' current snapshots.
#[derive(Debug)]
pub struct Dispatcher {
    content: Arc<ContentRegistry>,
    webhooks: Arc<WebhookRegistry>,
    client: WebhookClient,
    compressor: Arc<dyn ImageCompressor>,
    event_handler: Arc<dyn EventHandler>,
    clock: Arc<dyn Clock>,
    device: String,
}

impl Dispatcher {
    /// Creates a dispatcher with the passthrough compressor, no event
    /// subscribers, and the host OS as device identifier.
    pub fn new(
        content: Arc<ContentRegistry>,
        webhooks: Arc<WebhookRegistry>,
        client: WebhookClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            webhooks,
            client,
            compressor: Arc::new(PassthroughCompressor),
            event_handler: Arc::new(NoOpEventHandler),
            clock,
            device: crate::default_device(),
        }
    }

    /// Replaces the image compression hook.
    #[must_use]
    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Sets the handler receiving per-webhook delivery events.
    #[must_use]
    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = event_handler;
        self
    }

    /// Sets the `device` field sent in every payload.
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Content registry this dispatcher writes to.
    pub fn content(&self) -> &Arc<ContentRegistry> {
        &self.content
    }

    /// Webhook registry this dispatcher reads from.
    pub fn webhooks(&self) -> &Arc<WebhookRegistry> {
        &self.webhooks
    }

    /// Delivers an item to every enabled webhook accepting its kind.
    pub async fn upload_to_all_webhooks(&self, id: ContentId) -> DispatchOutcome {
        let Some(item) = self.content.get(id).await else {
            debug!(content_id = %id, "dispatch skipped: content not found");
            return DispatchOutcome::ContentNotFound;
        };

        let targets: Vec<WebhookConfig> = self
            .webhooks
            .enabled_webhooks()
            .await
            .into_iter()
            .filter(|webhook| webhook.accepts(item.kind))
            .collect();

        if targets.is_empty() {
            debug!(content_id = %id, kind = %item.kind, "dispatch skipped: no applicable webhooks");
            return DispatchOutcome::NoApplicableWebhooks;
        }

        info!(content_id = %id, kind = %item.kind, targets = targets.len(), "dispatching content");

        let results = join_all(targets.iter().map(|webhook| self.attempt(&item, webhook))).await;
        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        let failed = results.len() - succeeded;

        if succeeded > 0 {
            self.content.update_item_status(id, UploadStatus::Success, None).await;
            info!(content_id = %id, succeeded, failed, "content delivered");
            DispatchOutcome::Delivered { succeeded, failed }
        } else {
            let error = format!("all {failed} webhook deliveries failed");
            self.content.update_item_status(id, UploadStatus::Failed, Some(&error)).await;
            warn!(content_id = %id, failed, "content delivery failed");
            DispatchOutcome::AllFailed { failed }
        }
    }

    /// Delivers an item to a single webhook and records the result.
    ///
    /// Returns false without sending or writing anything if the webhook's
    /// categories do not accept the item's kind. Otherwise marks the item
    /// `uploading`, delivers, and writes `success` or `failed`.
    pub async fn upload_to_webhook(&self, item: &ContentItem, webhook: &WebhookConfig) -> bool {
        if !webhook.accepts(item.kind) {
            debug!(
                content_id = %item.id,
                webhook_id = %webhook.id,
                kind = %item.kind,
                "webhook does not accept content kind"
            );
            return false;
        }

        match self.attempt(item, webhook).await {
            Ok(_) => {
                self.content.update_item_status(item.id, UploadStatus::Success, None).await;
                true
            },
            Err(error) => {
                let message = error.to_string();
                self.content
                    .update_item_status(item.id, UploadStatus::Failed, Some(&message))
                    .await;
                false
            },
        }
    }

    /// One delivery attempt: interim status, request, events.
    async fn attempt(
        &self,
        item: &ContentItem,
        webhook: &WebhookConfig,
    ) -> Result<DeliveryResponse> {
        self.content.update_item_status(item.id, UploadStatus::Uploading, None).await;

        self.event_handler
            .handle_event(DeliveryEvent::AttemptStarted(AttemptStartedEvent {
                content_id: item.id,
                webhook_id: webhook.id,
                url: webhook.url.clone(),
                started_at: self.clock.now(),
            }))
            .await;

        let result = self.send(item, webhook).await;

        let event = match &result {
            Ok(response) => DeliveryEvent::Succeeded(DeliverySucceededEvent {
                outcome: self.outcome(item, webhook, UploadStatus::Success, None),
                url: webhook.url.clone(),
                response_status: response.status_code,
                duration_ms: u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
            }),
            Err(error) => {
                warn!(
                    content_id = %item.id,
                    webhook_id = %webhook.id,
                    error = %error,
                    category = %ErrorCategory::from(error),
                    "webhook delivery failed"
                );
                DeliveryEvent::Failed(DeliveryFailedEvent {
                    outcome: self.outcome(
                        item,
                        webhook,
                        UploadStatus::Failed,
                        Some(error.to_string()),
                    ),
                    url: webhook.url.clone(),
                    response_status: error.status_code(),
                })
            },
        };
        self.event_handler.handle_event(event).await;

        result
    }

    async fn send(&self, item: &ContentItem, webhook: &WebhookConfig) -> Result<DeliveryResponse> {
        let data = prepare_data(self.compressor.as_ref(), item)?;
        let body = UploadPayload::new(item, &data, &self.device).to_json()?;

        self.client
            .deliver(DeliveryRequest {
                content_id: item.id,
                webhook_id: webhook.id,
                url: &webhook.url,
                headers: &webhook.headers,
                body,
            })
            .await
    }

    fn outcome(
        &self,
        item: &ContentItem,
        webhook: &WebhookConfig,
        status: UploadStatus,
        error: Option<String>,
    ) -> DeliveryOutcome {
        DeliveryOutcome {
            content_id: item.id,
            webhook_id: webhook.id,
            status,
            error,
            last_attempt: self.clock.now(),
        }
    }
}
