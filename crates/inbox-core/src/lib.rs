//! Core domain models and registries for the inbox webhook relay.
//!
//! Provides the captured content and webhook destination models, the two
//! registries that own their mutation, the key-value persistence layer they
//! write through, and the delivery event types other crates emit. The
//! dispatch engine in `inbox-delivery` depends on these types only.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod models;
pub mod registry;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use events::{DeliveryEvent, EventHandler, MulticastEventHandler, NoOpEventHandler};
pub use models::{
    Category, ContentId, ContentItem, ContentKind, DeliveryOutcome, UploadStatus, WebhookConfig,
    WebhookId, WebhookUpdate,
};
pub use registry::{ContentRegistry, WebhookRegistry};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use time::{Clock, RealClock, TestClock};
