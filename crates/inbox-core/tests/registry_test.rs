//! Integration tests for the content and webhook registries.
//!
//! Focuses on hydration from existing state and the best-effort
//! persistence contract.

use std::sync::Arc;

use inbox_core::{
    storage::{backup_key, CONTENT_STORAGE_KEY, WEBHOOK_STORAGE_KEY},
    Category, ContentId, ContentKind, ContentRegistry, KeyValueStore, MemoryStore, TestClock,
    UploadStatus, WebhookId, WebhookRegistry,
};
use serde_json::json;

async fn content_registry(store: &MemoryStore) -> ContentRegistry {
    ContentRegistry::load(Arc::new(store.clone()), Arc::new(TestClock::new())).await
}

#[tokio::test]
async fn corrupt_state_loads_empty() {
    let store = MemoryStore::new();
    store.set(CONTENT_STORAGE_KEY, "{not json").await.unwrap();
    store.set(WEBHOOK_STORAGE_KEY, r#"{"state":{"webhooks":"nope"}}"#).await.unwrap();

    let content = content_registry(&store).await;
    let webhooks = WebhookRegistry::load(Arc::new(store.clone()), Arc::new(TestClock::new())).await;

    assert!(content.is_empty().await);
    assert!(webhooks.webhooks().await.is_empty());
    assert_eq!(store.raw(&backup_key(CONTENT_STORAGE_KEY)).await.as_deref(), Some("{not json"));
    assert!(store.raw(&backup_key(WEBHOOK_STORAGE_KEY)).await.is_some());
}

#[tokio::test]
async fn unreadable_items_are_skipped_not_fatal() {
    let store = MemoryStore::new();
    let kept = ContentId::new();
    let snapshot = json!({
        "state": {
            "items": [
                {
                    "id": kept.to_string(),
                    "type": "note",
                    "data": "keep me",
                    "createdAt": "2024-05-01T12:00:00Z",
                    "uploadStatus": "failed",
                    "retryCount": 2
                },
                {
                    "id": "1714564800000",
                    "type": "note",
                    "data": "legacy",
                    "createdAt": "2024-05-01T12:00:00Z",
                    "uploadStatus": "pending",
                    "retryCount": 0
                }
            ]
        },
        "version": 0
    })
    .to_string();
    store.set(CONTENT_STORAGE_KEY, &snapshot).await.unwrap();

    let registry = content_registry(&store).await;
    registry.add_item(ContentKind::Note, "new", None).await;

    let item = registry.get(kept).await.unwrap();
    assert_eq!(item.data, "keep me");
    assert_eq!(item.retry_count, 2);
    assert_eq!(registry.len().await, 2);

    let persisted = store.raw(CONTENT_STORAGE_KEY).await.unwrap();
    assert!(persisted.contains("keep me"));
    let backup = store.raw(&backup_key(CONTENT_STORAGE_KEY)).await.unwrap();
    assert!(backup.contains("1714564800000"));
}

#[tokio::test]
async fn webhook_with_unknown_category_does_not_drop_others() {
    let store = MemoryStore::new();
    let kept = WebhookId::new();
    let snapshot = json!({
        "state": {
            "webhooks": [
                {
                    "id": WebhookId::new().to_string(),
                    "name": "video",
                    "url": "https://video.test",
                    "headers": {},
                    "enabled": true,
                    "createdAt": "2024-05-01T12:00:00Z",
                    "categories": ["video"]
                },
                {
                    "id": kept.to_string(),
                    "name": "notes",
                    "url": "https://notes.test",
                    "headers": {},
                    "enabled": true,
                    "createdAt": "2024-05-01T12:00:00Z",
                    "categories": ["note"]
                }
            ]
        },
        "version": 0
    })
    .to_string();
    store.set(WEBHOOK_STORAGE_KEY, &snapshot).await.unwrap();

    let registry = WebhookRegistry::load(Arc::new(store.clone()), Arc::new(TestClock::new())).await;

    let ids: Vec<_> = registry.webhooks().await.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![kept]);
    assert_eq!(store.raw(&backup_key(WEBHOOK_STORAGE_KEY)).await.as_deref(), Some(&*snapshot));
}

#[tokio::test]
async fn clean_snapshot_writes_no_backup() {
    let store = MemoryStore::new();
    content_registry(&store).await.add_item(ContentKind::Note, "fine", None).await;

    content_registry(&store).await;

    assert!(store.raw(&backup_key(CONTENT_STORAGE_KEY)).await.is_none());
}

#[tokio::test]
async fn hydrates_existing_snapshot_in_order() {
    let store = MemoryStore::new();
    let first = content_registry(&store).await;
    let older = first.add_item(ContentKind::Note, "older", None).await;
    let newer = first.add_item(ContentKind::Gallery, "aGk=", Some("Beach".into())).await;

    let second = content_registry(&store).await;
    let ids: Vec<_> = second.items().await.iter().map(|item| item.id).collect();

    assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn write_failures_keep_in_memory_state() {
    let store = MemoryStore::new();
    let registry = content_registry(&store).await;
    store.fail_writes(true);

    let id = registry.add_item(ContentKind::Note, "offline", None).await;
    let updated = registry.update_item_status(id, UploadStatus::Failed, None).await.unwrap();

    assert_eq!(updated.retry_count, 1);
    assert_eq!(registry.get(id).await.unwrap().upload_status, UploadStatus::Failed);
    assert!(store.raw(CONTENT_STORAGE_KEY).await.is_none());
}

#[tokio::test]
async fn clear_then_add_starts_fresh() {
    let store = MemoryStore::new();
    let registry = content_registry(&store).await;
    registry.add_item(ContentKind::Note, "one", None).await;
    registry.add_item(ContentKind::Note, "two", None).await;

    registry.clear_items().await;
    let id = registry.add_item(ContentKind::Photo, "aGk=", None).await;

    let items = registry.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
}

#[tokio::test]
async fn deleted_webhook_is_gone_after_reload() {
    let store = MemoryStore::new();
    let clock = Arc::new(TestClock::new());
    let registry = WebhookRegistry::load(Arc::new(store.clone()), clock.clone()).await;
    let keep = registry
        .add_webhook("keep", "https://a.test", Default::default(), [Category::All].into())
        .await;
    let removed = registry
        .add_webhook("drop", "https://b.test", Default::default(), [Category::All].into())
        .await;

    registry.delete_webhook(removed).await.unwrap();

    let reloaded = WebhookRegistry::load(Arc::new(store), clock).await;
    let ids: Vec<_> = reloaded.webhooks().await.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![keep]);
}
