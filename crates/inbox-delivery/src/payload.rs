//! Outbound payload and the image compression hook.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};
use inbox_core::{ContentItem, ContentKind};
use serde::Serialize;

use crate::error::{DeliveryError, Result};

/// JSON body POSTed to every webhook.
///
/// ```json
/// { "type": "note", "data": "...", "title": "...", "timestamp": "...", "device": "linux" }
/// ```
///
/// `title` is omitted when the item has none. `timestamp` is the item's
/// capture time, not the send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadPayload<'a> {
    /// Content kind.
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Payload data, after compression for images.
    pub data: &'a str,
    /// Optional display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    /// When the item was captured.
    pub timestamp: DateTime<Utc>,
    /// Originating platform identifier.
    pub device: &'a str,
}

impl<'a> UploadPayload<'a> {
    /// Builds the payload for `item` with already-transformed `data`.
    pub fn new(item: &'a ContentItem, data: &'a str, device: &'a str) -> Self {
        Self {
            kind: item.kind,
            data,
            title: item.title.as_deref(),
            timestamp: item.created_at,
            device,
        }
    }

    /// Encodes the payload as a JSON request body.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Transform applied to image payloads before upload.
///
/// Receives and returns base64 image data. Notes never pass through it.
pub trait ImageCompressor: Send + Sync + fmt::Debug {
    /// Compresses base64 image data.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Compression` if the image cannot be
    /// processed. The delivery to that webhook then fails.
    fn compress<'a>(&self, data: &'a str) -> Result<Cow<'a, str>>;
}

/// Compressor that sends images unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompressor;

impl ImageCompressor for PassthroughCompressor {
    fn compress<'a>(&self, data: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(data))
    }
}

/// Runs the compressor for image kinds only.
pub(crate) fn prepare_data<'a>(
    compressor: &dyn ImageCompressor,
    item: &'a ContentItem,
) -> Result<Cow<'a, str>> {
    if item.kind.is_image() {
        compressor.compress(&item.data).map_err(|e| match e {
            DeliveryError::Compression { .. } => e,
            other => DeliveryError::compression(other.to_string()),
        })
    } else {
        Ok(Cow::Borrowed(item.data.as_str()))
    }
}
