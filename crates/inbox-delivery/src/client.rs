//! HTTP client for webhook delivery.
//!
//! Builds the outbound POST, applies the destination's header overlay, and
//! classifies the response. Anything in 200-399 counts as delivered.

use std::{collections::BTreeMap, time::Duration};

use inbox_core::{ContentId, WebhookId};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Response,
};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};

use crate::error::{DeliveryError, Result};

/// Response bodies kept for error reporting are cut to this many bytes.
const MAX_ERROR_BODY_BYTES: usize = 1024;

/// Configuration for the webhook client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout for a whole request, connect through body.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Maximum number of redirects to follow. Zero returns 3xx as-is.
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: concat!("inbox-webhook-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 5,
        }
    }
}

/// One outbound request to one webhook.
#[derive(Debug, Clone)]
pub struct DeliveryRequest<'a> {
    /// Item being delivered, for log context.
    pub content_id: ContentId,
    /// Destination webhook, for log context.
    pub webhook_id: WebhookId,
    /// Destination URL.
    pub url: &'a str,
    /// Configured header overlay.
    pub headers: &'a BTreeMap<String, String>,
    /// Encoded JSON payload.
    pub body: Vec<u8>,
}

/// Successful response from a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    /// HTTP status code, within 200-399.
    pub status_code: u16,
    /// Total duration of the request.
    pub duration: Duration,
}

/// Pooled HTTP client shared by every delivery.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl WebhookClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the underlying HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let redirect = match config.max_redirects {
            0 => reqwest::redirect::Policy::none(),
            max => reqwest::redirect::Policy::limited(max as usize),
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(redirect)
            .build()
            .map_err(|e| {
                DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs a payload to a webhook.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if a configured header is not valid HTTP
    /// - `Timeout` if the request exceeds the configured timeout
    /// - `Network` for connection and redirect failures
    /// - `HttpStatus` for any status outside 200-399
    pub async fn deliver(&self, request: DeliveryRequest<'_>) -> Result<DeliveryResponse> {
        let span = info_span!(
            "webhook_delivery",
            content_id = %request.content_id,
            webhook_id = %request.webhook_id,
            url = %request.url,
        );

        async move {
            let headers = build_headers(request.headers)?;
            let start_time = std::time::Instant::now();

            tracing::debug!(bytes = request.body.len(), "sending webhook request");

            let response =
                match self.client.post(request.url).headers(headers).body(request.body).send().await
                {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(
                            duration_ms = start_time.elapsed().as_millis(),
                            "request failed: {}",
                            e
                        );

                        if e.is_timeout() {
                            return Err(DeliveryError::timeout(self.config.timeout.as_secs()));
                        }
                        if e.is_connect() {
                            return Err(DeliveryError::network(format!("connection failed: {e}")));
                        }
                        return Err(DeliveryError::network(e.to_string()));
                    },
                };

            let duration = start_time.elapsed();
            let status_code = response.status().as_u16();

            tracing::debug!(
                status = status_code,
                duration_ms = duration.as_millis(),
                "received response"
            );

            if is_success_status(status_code) {
                tracing::info!(status = status_code, "webhook accepted content");
                return Ok(DeliveryResponse { status_code, duration });
            }

            let body = read_error_body(response).await;
            tracing::warn!(status = status_code, body = %body, "webhook rejected content");
            Err(DeliveryError::http_status(status_code, body))
        }
        .instrument(span)
        .await
    }
}

/// Status codes the relay treats as delivered.
pub fn is_success_status(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}

/// Default `Content-Type` first, then the configured overlay on top.
///
/// `HeaderMap::insert` replaces case-insensitively, so a configured
/// `content-type` wins over the default.
fn build_headers(configured: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(configured.len() + 1);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (key, value) in configured {
        if is_managed_header(key) {
            tracing::debug!(header = %key, "skipping transport-managed header");
            continue;
        }

        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| DeliveryError::invalid_header(key, e.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DeliveryError::invalid_header(key, e.to_string()))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

async fn read_error_body(response: Response) -> String {
    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_ERROR_BODY_BYTES => {
            let truncated = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_BYTES]);
            format!("{truncated}... (truncated)")
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("failed to read response body: {}", e);
            format!("[failed to read response body: {e}]")
        },
    }
}

/// Checks if a header is owned by the HTTP transport and must not be taken
/// from webhook configuration.
pub fn is_managed_header(header_name: &str) -> bool {
    let lowercase = header_name.trim().to_ascii_lowercase();
    matches!(
        lowercase.as_str(),
        "content-length"
            | "host"
            | "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}
