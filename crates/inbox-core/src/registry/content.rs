//! Content registry: ordered, persisted collection of captured items.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{hydrate, persist};
use crate::{
    models::{ContentId, ContentItem, ContentKind, UploadStatus},
    storage::{KeyValueStore, CONTENT_STORAGE_KEY},
    time::Clock,
};

#[derive(Debug, Serialize)]
struct ContentStateRef<'a> {
    items: &'a [ContentItem],
}

/// Captured items, most recent first.
///
/// The only component allowed to mutate `ContentItem`s. Status writes come
/// from the dispatch engine; everything else comes from capture and
/// housekeeping actions.
#[derive(Debug)]
pub struct ContentRegistry {
    items: RwLock<Vec<ContentItem>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ContentRegistry {
    /// Hydrates the registry from `store`.
    ///
    /// Missing state yields an empty registry. Unreadable items are skipped
    /// and the original snapshot is kept under the backup key.
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let items: Vec<ContentItem> = hydrate(store.as_ref(), CONTENT_STORAGE_KEY, "items").await;
        debug!(items = items.len(), "content registry loaded");

        Self { items: RwLock::new(items), store, clock }
    }

    /// Captures a new item in the `Pending` state and returns its id.
    ///
    /// The item is prepended so the collection stays most-recent-first.
    pub async fn add_item(
        &self,
        kind: ContentKind,
        data: impl Into<String>,
        title: Option<String>,
    ) -> ContentId {
        let item = ContentItem::new(kind, data, title, self.clock.now());
        let id = item.id;

        let mut items = self.items.write().await;
        items.insert(0, item);
        self.persist(&items).await;
        drop(items);

        info!(content_id = %id, kind = %kind, "content item captured");
        id
    }

    /// Sets an item's upload status.
    ///
    /// Entering `Failed` increments the retry count. The optional error is
    /// logged but not stored. Returns the updated item, or `None` (and does
    /// nothing) if the id is unknown.
    pub async fn update_item_status(
        &self,
        id: ContentId,
        status: UploadStatus,
        error: Option<&str>,
    ) -> Option<ContentItem> {
        let mut items = self.items.write().await;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            debug!(content_id = %id, %status, "status update for unknown item ignored");
            return None;
        };

        item.upload_status = status;
        if status == UploadStatus::Failed {
            item.retry_count = item.retry_count.saturating_add(1);
        }
        let updated = item.clone();

        self.persist(&items).await;
        drop(items);

        debug!(
            content_id = %id,
            %status,
            retry_count = updated.retry_count,
            error = error.unwrap_or_default(),
            "content status updated"
        );
        Some(updated)
    }

    /// Removes one item. Returns it, or `None` if the id is unknown.
    pub async fn delete_item(&self, id: ContentId) -> Option<ContentItem> {
        let mut items = self.items.write().await;
        let position = items.iter().position(|item| item.id == id)?;
        let removed = items.remove(position);
        self.persist(&items).await;
        drop(items);

        info!(content_id = %id, "content item deleted");
        Some(removed)
    }

    /// Removes every item.
    pub async fn clear_items(&self) {
        let mut items = self.items.write().await;
        let cleared = items.len();
        items.clear();
        self.persist(&items).await;
        drop(items);

        info!(cleared, "content items cleared");
    }

    /// Snapshot of all items, most recent first.
    pub async fn items(&self) -> Vec<ContentItem> {
        self.items.read().await.clone()
    }

    /// Looks up one item.
    pub async fn get(&self, id: ContentId) -> Option<ContentItem> {
        self.items.read().await.iter().find(|item| item.id == id).cloned()
    }

    /// Number of items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns true if there are no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn persist(&self, items: &[ContentItem]) {
        persist(self.store.as_ref(), CONTENT_STORAGE_KEY, ContentStateRef { items }).await;
    }
}
