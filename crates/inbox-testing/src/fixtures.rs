//! Builders for content items and webhooks.
//!
//! Both build through the real registry operations, so fixtures go through
//! the same persistence path as production data.

use std::collections::{BTreeMap, BTreeSet};

use inbox_core::{
    Category, ContentId, ContentKind, ContentRegistry, UploadStatus, WebhookId, WebhookRegistry,
};

/// Builder for content items.
#[derive(Debug, Clone)]
pub struct ContentBuilder {
    kind: ContentKind,
    data: String,
    title: Option<String>,
    failures: u32,
    status: Option<UploadStatus>,
}

impl ContentBuilder {
    /// A pending note.
    pub fn note(text: impl Into<String>) -> Self {
        Self { kind: ContentKind::Note, data: text.into(), title: None, failures: 0, status: None }
    }

    /// A pending camera photo with a tiny base64 payload.
    pub fn photo() -> Self {
        Self { kind: ContentKind::Photo, ..Self::note("aW1hZ2U=") }
    }

    /// A pending gallery image with a tiny base64 payload.
    pub fn gallery() -> Self {
        Self { kind: ContentKind::Gallery, ..Self::note("Z2FsbGVyeQ==") }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Marks the item failed `count` times, leaving it in `failed` state
    /// with that retry count.
    #[must_use]
    pub fn failed(mut self, count: u32) -> Self {
        self.failures = count;
        self
    }

    /// Status written after any replayed failures. Setting `Failed` here
    /// counts as one more failure.
    #[must_use]
    pub fn status(mut self, status: UploadStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds the item to `registry` and replays its history.
    pub async fn create(self, registry: &ContentRegistry) -> ContentId {
        let id = registry.add_item(self.kind, self.data, self.title).await;
        for _ in 0..self.failures {
            registry.update_item_status(id, UploadStatus::Failed, Some("fixture")).await;
        }
        if let Some(status) = self.status {
            registry.update_item_status(id, status, None).await;
        }
        id
    }
}

/// Builder for webhooks.
#[derive(Debug, Clone)]
pub struct WebhookBuilder {
    name: String,
    url: String,
    headers: BTreeMap<String, String>,
    categories: BTreeSet<Category>,
    enabled: bool,
}

impl Default for WebhookBuilder {
    fn default() -> Self {
        Self::accepting(&[Category::All])
    }
}

impl WebhookBuilder {
    /// An enabled webhook accepting the given categories.
    pub fn accepting(categories: &[Category]) -> Self {
        Self {
            name: "test webhook".to_string(),
            url: "http://127.0.0.1:9/unused".to_string(),
            headers: BTreeMap::new(),
            categories: categories.iter().copied().collect(),
            enabled: true,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Adds a configured header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Creates the webhook disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Adds the webhook to `registry`.
    pub async fn create(self, registry: &WebhookRegistry) -> WebhookId {
        let id = registry.add_webhook(self.name, self.url, self.headers, self.categories).await;
        if !self.enabled {
            registry.toggle_webhook(id).await;
        }
        id
    }
}
