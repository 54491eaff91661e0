//! Upload dispatch for captured content.
//!
//! Delivers content items from the [`inbox_core::ContentRegistry`] to the
//! webhooks in the [`inbox_core::WebhookRegistry`] and retries failures.
//!
//! # Architecture
//!
//! ```text
//! capture ──▶ ContentRegistry ──▶ Dispatcher ──┬──▶ WebhookClient ──▶ webhook A
//!                    ▲                         ├──▶ WebhookClient ──▶ webhook B
//!                    │                         └──▶ ...
//!                    └────── RetrySweeper (failed && retry_count < cap)
//! ```
//!
//! 1. **Select** - enabled webhooks whose categories accept the item's kind
//! 2. **Fan out** - one concurrent POST per webhook, all awaited
//! 3. **Aggregate** - any success wins; all failures mark the item failed
//! 4. **Sweep** - failed items below the retry cap are re-dispatched in turn
//!
//! Delivery failures never surface as errors to callers. They are logged,
//! emitted as [`inbox_core::DeliveryEvent`]s, and recorded in the item's
//! status and retry count.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inbox_core::{ContentKind, ContentRegistry, MemoryStore, RealClock, WebhookRegistry};
//! use inbox_delivery::{Dispatcher, WebhookClient};
//!
//! # async fn example() -> Result<(), inbox_delivery::DeliveryError> {
//! let store = Arc::new(MemoryStore::new());
//! let clock = Arc::new(RealClock::new());
//! let content = Arc::new(ContentRegistry::load(store.clone(), clock.clone()).await);
//! let webhooks = Arc::new(WebhookRegistry::load(store, clock.clone()).await);
//!
//! let client = WebhookClient::with_defaults()?;
//! let dispatcher = Dispatcher::new(content.clone(), webhooks, client, clock);
//! let id = content.add_item(ContentKind::Note, "hello", None).await;
//! let outcome = dispatcher.upload_to_all_webhooks(id).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod dispatch;
pub mod error;
pub mod payload;
pub mod retry;

pub use client::{ClientConfig, WebhookClient};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{DeliveryError, ErrorCategory, Result};
pub use payload::{ImageCompressor, PassthroughCompressor, UploadPayload};
pub use retry::{RetryPolicy, RetrySweeper, SweepReport};

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Default automatic retry cap.
pub const DEFAULT_MAX_AUTOMATIC_RETRIES: u32 = 3;

/// Platform identifier sent when none is configured: the host OS name.
pub fn default_device() -> String {
    std::env::consts::OS.to_string()
}
