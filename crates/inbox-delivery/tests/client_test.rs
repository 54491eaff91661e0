//! Integration tests for the webhook HTTP client.
//!
//! Covers response classification, header overlay and timeouts against a
//! wiremock server.

#![allow(clippy::unwrap_used)]

use std::{collections::BTreeMap, time::Duration};

use inbox_core::{ContentId, WebhookId};
use inbox_delivery::{
    client::{ClientConfig, DeliveryRequest, WebhookClient},
    DeliveryError,
};
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

fn request<'a>(url: &'a str, headers: &'a BTreeMap<String, String>) -> DeliveryRequest<'a> {
    DeliveryRequest {
        content_id: ContentId::new(),
        webhook_id: WebhookId::new(),
        url,
        headers,
        body: br#"{"type":"note"}"#.to_vec(),
    }
}

#[tokio::test]
async fn delivers_json_with_default_content_type() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/hook"))
        .and(matchers::header("content-type", "application/json"))
        .and(matchers::body_json(serde_json::json!({"type": "note"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::with_defaults().unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::new();

    let response = client.deliver(request(&url, &headers)).await.unwrap();

    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn configured_headers_override_and_extend() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::header("content-type", "application/vnd.custom+json"))
        .and(matchers::header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::with_defaults().unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::from([
        ("Content-Type".to_string(), "application/vnd.custom+json".to_string()),
        ("Authorization".to_string(), "Bearer token".to_string()),
    ]);

    let response = client.deliver(request(&url, &headers)).await.unwrap();

    assert_eq!(response.status_code, 201);
}

#[tokio::test]
async fn redirect_status_counts_as_success_without_following() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;

    let client =
        WebhookClient::new(ClientConfig { max_redirects: 0, ..ClientConfig::default() }).unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::new();

    let response = client.deliver(request(&url, &headers)).await.unwrap();

    assert_eq!(response.status_code, 302);
}

#[tokio::test]
async fn error_statuses_are_failures_with_body() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = WebhookClient::with_defaults().unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::new();

    let error = client.deliver(request(&url, &headers)).await.unwrap_err();

    assert_eq!(error, DeliveryError::http_status(500, "boom"));
}

#[tokio::test]
async fn client_errors_are_failures() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = WebhookClient::with_defaults().unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::new();

    let error = client.deliver(request(&url, &headers)).await.unwrap_err();

    assert_eq!(error.status_code(), Some(404));
}

#[tokio::test]
async fn slow_webhook_times_out() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = WebhookClient::new(ClientConfig {
        timeout: Duration::from_millis(200),
        ..ClientConfig::default()
    })
    .unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::new();

    let error = client.deliver(request(&url, &headers)).await.unwrap_err();

    assert!(matches!(error, DeliveryError::Timeout { .. }), "got {error:?}");
}

#[tokio::test]
async fn unreachable_webhook_is_network_error() {
    let client = WebhookClient::with_defaults().unwrap();
    let headers = BTreeMap::new();

    let error = client.deliver(request("http://127.0.0.1:9/hook", &headers)).await.unwrap_err();

    assert!(matches!(error, DeliveryError::Network { .. }), "got {error:?}");
}

#[tokio::test]
async fn invalid_header_value_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = WebhookClient::with_defaults().unwrap();
    let url = format!("{}/hook", server.uri());
    let headers = BTreeMap::from([("X-Bad".to_string(), "line\nbreak".to_string())]);

    let error = client.deliver(request(&url, &headers)).await.unwrap_err();

    assert!(matches!(error, DeliveryError::InvalidHeader { .. }));
}
