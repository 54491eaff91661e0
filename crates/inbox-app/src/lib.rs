//! Application layer of the inbox webhook relay.
//!
//! Loads configuration, validates what users type into the webhook form,
//! and wires storage, registries, dispatcher and sweeper into [`InboxApp`].

pub mod app;
pub mod config;
pub mod error;
pub mod form;

pub use app::{Capture, InboxApp};
pub use config::Config;
pub use error::{AppError, Result};
pub use form::{validate_note, ValidWebhook, ValidationError, WebhookForm};
