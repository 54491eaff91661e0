//! Webhook form validation.
//!
//! Everything a user types passes through here before it reaches the
//! webhook registry, which accepts whatever it is given.

use std::collections::{BTreeMap, BTreeSet};

use inbox_core::{Category, WebhookUpdate};
use thiserror::Error;

/// Rejected user input. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Webhook name is blank.
    #[error("Name is required")]
    NameRequired,

    /// Webhook URL is blank.
    #[error("URL is required")]
    UrlRequired,

    /// Webhook URL has no http(s) scheme.
    #[error("URL must start with http:// or https://")]
    UrlScheme,

    /// No category selected.
    #[error("At least one category must be selected")]
    CategoryRequired,

    /// Note text is blank.
    #[error("Note cannot be empty")]
    EmptyNote,
}

/// Raw webhook form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookForm {
    /// Display name, untrimmed.
    pub name: String,
    /// Destination URL, untrimmed.
    pub url: String,
    /// Header rows in entry order. Blank rows are allowed.
    pub headers: Vec<(String, String)>,
    /// Selected categories.
    pub categories: BTreeSet<Category>,
}

/// Webhook fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidWebhook {
    /// Trimmed display name.
    pub name: String,
    /// Trimmed URL.
    pub url: String,
    /// Header rows with both key and value present, trimmed.
    pub headers: BTreeMap<String, String>,
    /// `{all}` if `all` was selected, the selection otherwise.
    pub categories: BTreeSet<Category>,
}

impl WebhookForm {
    /// Validates the form and normalizes its fields.
    ///
    /// Checks run in form order and the first failure is returned. The
    /// scheme check looks at the URL exactly as typed.
    pub fn validate(self) -> Result<ValidWebhook, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }

        if self.url.trim().is_empty() {
            return Err(ValidationError::UrlRequired);
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::UrlScheme);
        }

        if self.categories.is_empty() {
            return Err(ValidationError::CategoryRequired);
        }
        let categories = if self.categories.contains(&Category::All) {
            BTreeSet::from([Category::All])
        } else {
            self.categories
        };

        let headers = self
            .headers
            .iter()
            .map(|(key, value)| (key.trim(), value.trim()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Ok(ValidWebhook {
            name: name.to_string(),
            url: self.url.trim().to_string(),
            headers,
            categories,
        })
    }
}

impl ValidWebhook {
    /// Full replacement of the editable fields, keeping `enabled` as is.
    pub fn into_update(self) -> WebhookUpdate {
        WebhookUpdate {
            name: Some(self.name),
            url: Some(self.url),
            headers: Some(self.headers),
            categories: Some(self.categories),
            enabled: None,
        }
    }
}

/// Trims a note and rejects it if nothing is left.
pub fn validate_note(text: &str) -> Result<&str, ValidationError> {
    match text.trim() {
        "" => Err(ValidationError::EmptyNote),
        trimmed => Ok(trimmed),
    }
}
