//! Core domain models and strongly-typed identifiers.
//!
//! Defines captured content items, webhook destinations, the category
//! matching rule that connects them, and newtype ID wrappers. Field names
//! serialize in camelCase in persisted snapshots and outbound payloads.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Strongly-typed content item identifier.
///
/// Wraps a UUID v7 so identifiers sort by creation time. Assigned by the
/// content registry when an item is captured and never changed afterwards.
///
/// # Example
///
/// ```
/// use inbox_core::models::ContentId;
/// let id = ContentId::new();
/// println!("captured item {id}");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub Uuid);

impl ContentId {
    /// Creates a new time-ordered content ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ContentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for ContentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::invalid_input(format!("invalid content id {s:?}: {e}")))
    }
}

/// Strongly-typed webhook identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(pub Uuid);

impl WebhookId {
    /// Creates a new time-ordered webhook ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for WebhookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for WebhookId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for WebhookId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::invalid_input(format!("invalid webhook id {s:?}: {e}")))
    }
}

/// Kind of captured content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Photo taken with the camera. Payload is base64.
    Photo,
    /// Image picked from the gallery. Payload is base64.
    Gallery,
    /// Text note. Payload is plain text.
    Note,
}

impl ContentKind {
    /// Returns true for kinds whose payload is base64 image data.
    pub const fn is_image(self) -> bool {
        matches!(self, Self::Photo | Self::Gallery)
    }

    /// Wire name used in payloads and persisted state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Gallery => "gallery",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(Self::Photo),
            "gallery" => Ok(Self::Gallery),
            "note" => Ok(Self::Note),
            _ => Err(CoreError::invalid_input(format!("unknown content type: {s}"))),
        }
    }
}

/// Content category a webhook accepts.
///
/// `All` is a wildcard that matches every content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Camera photos.
    Photo,
    /// Gallery images.
    Gallery,
    /// Text notes.
    Note,
    /// Every content kind.
    All,
}

impl Category {
    /// Returns true if this category accepts content of the given kind.
    pub fn matches(self, kind: ContentKind) -> bool {
        self == Self::All || self == Self::from(kind)
    }

    /// Wire name used in persisted state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Gallery => "gallery",
            Self::Note => "note",
            Self::All => "all",
        }
    }
}

impl From<ContentKind> for Category {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Photo => Self::Photo,
            ContentKind::Gallery => Self::Gallery,
            ContentKind::Note => Self::Note,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(Self::Photo),
            "gallery" => Ok(Self::Gallery),
            "note" => Ok(Self::Note),
            "all" => Ok(Self::All),
            _ => Err(CoreError::invalid_input(format!("unknown category: {s}"))),
        }
    }
}

/// Delivery status of a content item.
///
/// Written only by the dispatch engine:
///
/// ```text
/// Pending -> Uploading -> Success
///                      -> Failed -> Uploading (retry)
/// ```
///
/// Every transition into `Failed` bumps the item's retry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Captured, not yet attempted (or no webhook matched).
    Pending,
    /// Delivery in flight. UI hint only.
    Uploading,
    /// At least one webhook accepted the item.
    Success,
    /// Every matching webhook rejected the item.
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Uploading => write!(f, "uploading"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A captured unit of content awaiting or having undergone delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Unique, time-ordered identifier.
    pub id: ContentId,

    /// Kind of content. Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ContentKind,

    /// Base64 image data for photo/gallery, plain text for notes.
    pub data: String,

    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// When the item was captured.
    pub created_at: DateTime<Utc>,

    /// Current delivery status.
    pub upload_status: UploadStatus,

    /// Number of transitions into `Failed`. Never decreases.
    #[serde(default)]
    pub retry_count: u32,
}

impl ContentItem {
    /// Creates a freshly captured item in the `Pending` state.
    pub fn new(
        kind: ContentKind,
        data: impl Into<String>,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContentId::new(),
            kind,
            data: data.into(),
            title,
            created_at,
            upload_status: UploadStatus::Pending,
            retry_count: 0,
        }
    }
}

/// Configuration of an external webhook destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Unique identifier.
    pub id: WebhookId,

    /// Display label.
    pub name: String,

    /// Destination URL. Scheme is checked by the form layer, not here.
    pub url: String,

    /// Extra headers merged into every request to this destination.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Disabled webhooks are never dispatch targets.
    pub enabled: bool,

    /// When the webhook was created.
    pub created_at: DateTime<Utc>,

    /// Accepted categories. Empty matches nothing.
    #[serde(default)]
    pub categories: BTreeSet<Category>,
}

impl WebhookConfig {
    /// Returns true if any configured category accepts the given kind.
    pub fn accepts(&self, kind: ContentKind) -> bool {
        self.categories.iter().any(|category| category.matches(kind))
    }

    /// Returns true if this webhook is enabled and accepts the given kind.
    pub fn is_target_for(&self, kind: ContentKind) -> bool {
        self.enabled && self.accepts(kind)
    }
}

/// Partial update for a webhook.
///
/// Fields left as `None` keep their current value. The id and creation
/// timestamp are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookUpdate {
    /// New display label.
    pub name: Option<String>,
    /// New destination URL.
    pub url: Option<String>,
    /// Replacement header map.
    pub headers: Option<BTreeMap<String, String>>,
    /// Replacement category set.
    pub categories: Option<BTreeSet<Category>>,
    /// New enabled flag.
    pub enabled: Option<bool>,
}

impl WebhookUpdate {
    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.headers.is_none()
            && self.categories.is_none()
            && self.enabled.is_none()
    }

    /// Merges the set fields into `webhook`.
    pub fn apply_to(self, webhook: &mut WebhookConfig) {
        if let Some(name) = self.name {
            webhook.name = name;
        }
        if let Some(url) = self.url {
            webhook.url = url;
        }
        if let Some(headers) = self.headers {
            webhook.headers = headers;
        }
        if let Some(categories) = self.categories {
            webhook.categories = categories;
        }
        if let Some(enabled) = self.enabled {
            webhook.enabled = enabled;
        }
    }
}

/// Result of one delivery attempt of one item to one webhook.
///
/// Emitted through delivery events for observers. Not persisted: the item's
/// own status is the only durable delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    /// Item that was delivered.
    pub content_id: ContentId,
    /// Destination of the attempt.
    pub webhook_id: WebhookId,
    /// `Success` or `Failed`.
    pub status: UploadStatus,
    /// Failure description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the attempt settled.
    pub last_attempt: DateTime<Utc>,
}
