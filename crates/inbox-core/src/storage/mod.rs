//! Durable key-value persistence for registry snapshots.
//!
//! Each registry serializes its whole collection to JSON and writes it under
//! a fixed key after every mutation. The store itself knows nothing about
//! the shape of the values.
//!
//! Two backends are provided:
//!
//! - [`SqliteStore`] for the application, one row per key.
//! - [`MemoryStore`] for tests, with write-failure injection.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{CoreError, Result};

mod sqlite;

pub use sqlite::{SqliteStore, IN_MEMORY_PATH};

/// Storage key for the content registry snapshot.
pub const CONTENT_STORAGE_KEY: &str = "content-storage";

/// Storage key for the webhook registry snapshot.
pub const WEBHOOK_STORAGE_KEY: &str = "webhook-storage";

/// Key under which an unreadable snapshot stored at `key` is preserved.
pub fn backup_key(key: &str) -> String {
    format!("{key}-backup")
}

/// Schema version written into every snapshot envelope.
pub const STATE_VERSION: u32 = 0;

/// Async string key-value store.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Releases backend resources. Later calls may fail.
    async fn close(&self) {}
}

/// Versioned envelope around a persisted registry state.
///
/// Serializes as `{ "state": ..., "version": 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState<T> {
    /// Registry state.
    pub state: T,
    /// Schema version.
    #[serde(default)]
    pub version: u32,
}

impl<T: Serialize> PersistedState<T> {
    /// Wraps `state` in an envelope at the current schema version.
    pub fn new(state: T) -> Self {
        Self { state, version: STATE_VERSION }
    }

    /// Encodes the envelope as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> PersistedState<T> {
    /// Decodes an envelope from JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// In-memory store for tests.
///
/// Clones share the same map. Writes can be made to fail on demand so the
/// best-effort persistence path of the registries can be exercised.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` and `remove` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reads a raw value without going through the trait.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::storage("injected write failure"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values.write().await.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.values.write().await.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
