//! Webhook registry: persisted destination configurations.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{hydrate, persist};
use crate::{
    models::{Category, WebhookConfig, WebhookId, WebhookUpdate},
    storage::{KeyValueStore, WEBHOOK_STORAGE_KEY},
    time::Clock,
};

#[derive(Debug, Serialize)]
struct WebhookStateRef<'a> {
    webhooks: &'a [WebhookConfig],
}

/// Webhook destinations in insertion order.
///
/// Accepts any record matching the schema; field validation belongs to the
/// configuring layer.
#[derive(Debug)]
pub struct WebhookRegistry {
    webhooks: RwLock<Vec<WebhookConfig>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl WebhookRegistry {
    /// Hydrates the registry from `store`, skipping unreadable records.
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let webhooks: Vec<WebhookConfig> =
            hydrate(store.as_ref(), WEBHOOK_STORAGE_KEY, "webhooks").await;
        debug!(webhooks = webhooks.len(), "webhook registry loaded");

        Self { webhooks: RwLock::new(webhooks), store, clock }
    }

    /// Appends a new, enabled webhook and returns its id.
    pub async fn add_webhook(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        headers: BTreeMap<String, String>,
        categories: BTreeSet<Category>,
    ) -> WebhookId {
        let webhook = WebhookConfig {
            id: WebhookId::new(),
            name: name.into(),
            url: url.into(),
            headers,
            enabled: true,
            created_at: self.clock.now(),
            categories,
        };
        let id = webhook.id;

        let mut webhooks = self.webhooks.write().await;
        webhooks.push(webhook);
        self.persist(&webhooks).await;
        drop(webhooks);

        info!(webhook_id = %id, "webhook added");
        id
    }

    /// Merges `update` into an existing webhook.
    ///
    /// Returns the updated record, or `None` if the id is unknown.
    pub async fn update_webhook(
        &self,
        id: WebhookId,
        update: WebhookUpdate,
    ) -> Option<WebhookConfig> {
        self.modify(id, |webhook| update.apply_to(webhook)).await
    }

    /// Flips the enabled flag. Returns the updated record, or `None`.
    pub async fn toggle_webhook(&self, id: WebhookId) -> Option<WebhookConfig> {
        let toggled = self.modify(id, |webhook| webhook.enabled = !webhook.enabled).await;
        if let Some(webhook) = &toggled {
            info!(webhook_id = %id, enabled = webhook.enabled, "webhook toggled");
        }
        toggled
    }

    /// Removes a webhook. Returns it, or `None` if the id is unknown.
    pub async fn delete_webhook(&self, id: WebhookId) -> Option<WebhookConfig> {
        let mut webhooks = self.webhooks.write().await;
        let position = webhooks.iter().position(|webhook| webhook.id == id)?;
        let removed = webhooks.remove(position);
        self.persist(&webhooks).await;
        drop(webhooks);

        info!(webhook_id = %id, "webhook deleted");
        Some(removed)
    }

    /// Snapshot of all webhooks in insertion order.
    pub async fn webhooks(&self) -> Vec<WebhookConfig> {
        self.webhooks.read().await.clone()
    }

    /// Snapshot of enabled webhooks in insertion order.
    pub async fn enabled_webhooks(&self) -> Vec<WebhookConfig> {
        self.webhooks.read().await.iter().filter(|webhook| webhook.enabled).cloned().collect()
    }

    /// Looks up one webhook.
    pub async fn get(&self, id: WebhookId) -> Option<WebhookConfig> {
        self.webhooks.read().await.iter().find(|webhook| webhook.id == id).cloned()
    }

    async fn modify(
        &self,
        id: WebhookId,
        change: impl FnOnce(&mut WebhookConfig),
    ) -> Option<WebhookConfig> {
        let mut webhooks = self.webhooks.write().await;
        let Some(webhook) = webhooks.iter_mut().find(|webhook| webhook.id == id) else {
            debug!(webhook_id = %id, "change for unknown webhook ignored");
            return None;
        };

        change(webhook);
        let updated = webhook.clone();
        self.persist(&webhooks).await;
        Some(updated)
    }

    async fn persist(&self, webhooks: &[WebhookConfig]) {
        persist(self.store.as_ref(), WEBHOOK_STORAGE_KEY, WebhookStateRef { webhooks }).await;
    }
}
