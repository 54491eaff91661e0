//! wiremock helpers for webhook destinations.

use std::time::Duration;

use serde_json::Value;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mounts a POST handler at `route` answering with `status`.
///
/// With `expected_calls` set, the server verifies the exact call count when
/// it is dropped.
pub async fn mock_webhook(
    server: &MockServer,
    route: &str,
    status: u16,
    expected_calls: Option<u64>,
) {
    let mut mock =
        Mock::given(method("POST")).and(path(route)).respond_with(ResponseTemplate::new(status));
    if let Some(calls) = expected_calls {
        mock = mock.expect(calls);
    }
    mock.mount(server).await;
}

/// Mounts a POST handler at `route` that answers with `status` after `delay`.
pub async fn mock_slow_webhook(server: &MockServer, route: &str, status: u16, delay: Duration) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_delay(delay))
        .mount(server)
        .await;
}

/// JSON bodies of every request received at `route`, in arrival order.
pub async fn received_payloads(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

/// Number of requests received at `route`.
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
