//! Registries owning captured content and webhook destinations.
//!
//! Each registry is an explicitly constructed object holding its collection
//! behind a `tokio::sync::RwLock`. Mutations take the write lock, change the
//! collection, and write the full snapshot to the key-value store before
//! releasing it, so persisted snapshots follow mutation order. Lookups of
//! unknown ids are silent no-ops that return `None`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::storage::{backup_key, KeyValueStore, PersistedState};

mod content;
mod webhooks;

pub use content::ContentRegistry;
pub use webhooks::WebhookRegistry;

/// Reads the records stored under `key`, one at a time.
///
/// The envelope is decoded loosely and each record under `field` is decoded
/// on its own, so one unreadable record costs only itself. Whenever anything
/// is dropped, the raw snapshot is copied to the backup key first, because
/// the next mutation overwrites `key`.
async fn hydrate<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    field: &str,
) -> Vec<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "no persisted state, starting empty");
            return Vec::new();
        },
        Err(error) => {
            warn!(key, error = %error, "failed to read persisted state, starting empty");
            return Vec::new();
        },
    };

    let records = match PersistedState::<Value>::from_json(&raw) {
        Ok(PersistedState { state: Value::Object(mut state), .. }) => match state.remove(field) {
            Some(Value::Array(records)) => records,
            Some(_) => {
                warn!(key, field, "persisted state has no record list, starting empty");
                back_up(store, key, &raw).await;
                return Vec::new();
            },
            None => Vec::new(),
        },
        Ok(_) => {
            warn!(key, "persisted state is not an object, starting empty");
            back_up(store, key, &raw).await;
            return Vec::new();
        },
        Err(error) => {
            warn!(key, error = %error, "discarding malformed persisted state");
            back_up(store, key, &raw).await;
            return Vec::new();
        },
    };

    let total = records.len();
    let loaded: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(key, index, error = %error, "skipping unreadable persisted record");
                None
            },
        })
        .collect();

    if loaded.len() < total {
        back_up(store, key, &raw).await;
    }
    loaded
}

/// Copies an unreadable snapshot aside before it can be overwritten.
async fn back_up(store: &dyn KeyValueStore, key: &str, raw: &str) {
    let backup = backup_key(key);
    match store.set(&backup, raw).await {
        Ok(()) => warn!(key, backup = %backup, "original persisted state saved to backup key"),
        Err(error) => warn!(key, error = %error, "failed to back up persisted state"),
    }
}

/// Writes a snapshot. Failures are logged, never returned.
async fn persist<T: Serialize>(store: &dyn KeyValueStore, key: &str, state: T) {
    let json = match PersistedState::new(state).to_json() {
        Ok(json) => json,
        Err(error) => {
            warn!(key, error = %error, "failed to encode state for persistence");
            return;
        },
    };

    if let Err(error) = store.set(key, &json).await {
        warn!(key, error = %error, "failed to persist state");
    }
}
