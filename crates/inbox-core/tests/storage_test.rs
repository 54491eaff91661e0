//! Integration tests for the SQLite key-value store.
//!
//! Exercises both the file-backed and in-memory databases and checks that
//! registry snapshots survive a reopen.

use std::{path::Path, sync::Arc};

use inbox_core::{
    storage::{CONTENT_STORAGE_KEY, IN_MEMORY_PATH, WEBHOOK_STORAGE_KEY},
    Category, ContentKind, ContentRegistry, KeyValueStore, SqliteStore, TestClock,
    UploadStatus, WebhookRegistry,
};
use serde_json::Value;

#[tokio::test]
async fn in_memory_store_get_set_remove() {
    let store = SqliteStore::in_memory().await.unwrap();

    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("key", "one").await.unwrap();
    store.set("key", "two").await.unwrap();
    assert_eq!(store.get("key").await.unwrap().as_deref(), Some("two"));

    store.remove("key").await.unwrap();
    store.remove("key").await.unwrap();
    assert_eq!(store.get("key").await.unwrap(), None);
}

#[tokio::test]
async fn memory_path_opens_private_database() {
    let first = SqliteStore::open(IN_MEMORY_PATH).await.unwrap();
    first.set("key", "value").await.unwrap();

    let second = SqliteStore::open(IN_MEMORY_PATH).await.unwrap();

    assert_eq!(first.get("key").await.unwrap().as_deref(), Some("value"));
    assert_eq!(second.get("key").await.unwrap(), None);
    assert!(!Path::new(IN_MEMORY_PATH).exists());
}

#[tokio::test]
async fn file_store_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("inbox.db");

    let store = SqliteStore::open(&path).await.unwrap();
    store.set("key", "value").await.unwrap();
    store.close().await;

    assert!(path.exists());
}

#[tokio::test]
async fn registries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.db");
    let clock = Arc::new(TestClock::new());

    let (item_id, webhook_id) = {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).await.unwrap());
        let content = ContentRegistry::load(store.clone(), clock.clone()).await;
        let webhooks = WebhookRegistry::load(store.clone(), clock.clone()).await;

        let item_id = content.add_item(ContentKind::Note, "remember", None).await;
        content.update_item_status(item_id, UploadStatus::Failed, Some("HTTP 500")).await;
        let webhook_id = webhooks
            .add_webhook(
                "archive",
                "https://example.com/hook",
                [("Authorization".to_string(), "Bearer t".to_string())].into(),
                [Category::Note].into(),
            )
            .await;
        (item_id, webhook_id)
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).await.unwrap());
    let content = ContentRegistry::load(store.clone(), clock.clone()).await;
    let webhooks = WebhookRegistry::load(store, clock).await;

    let item = content.get(item_id).await.unwrap();
    assert_eq!(item.upload_status, UploadStatus::Failed);
    assert_eq!(item.retry_count, 1);

    let webhook = webhooks.get(webhook_id).await.unwrap();
    assert_eq!(webhook.headers.get("Authorization").map(String::as_str), Some("Bearer t"));
    assert!(webhook.enabled);
}

#[tokio::test]
async fn snapshots_use_versioned_envelope() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let clock = Arc::new(TestClock::new());
    let content = ContentRegistry::load(store.clone(), clock.clone()).await;
    let webhooks = WebhookRegistry::load(store.clone(), clock).await;

    content.add_item(ContentKind::Note, "hello", None).await;
    webhooks
        .add_webhook("a", "https://a.test", Default::default(), [Category::All].into())
        .await;

    let raw = store.get(CONTENT_STORAGE_KEY).await.unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 0);
    assert_eq!(value["state"]["items"][0]["data"], "hello");
    assert_eq!(value["state"]["items"][0]["uploadStatus"], "pending");

    let raw = store.get(WEBHOOK_STORAGE_KEY).await.unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["state"]["webhooks"][0]["categories"][0], "all");
}
