//! End-to-end tests driving the `inbox` binary against mock webhooks.
//!
//! Each test gets its own working directory and database, so the binary sees
//! no `inbox.toml` and starts from an empty store.

use std::{path::Path, process::Output};

use inbox_testing::http::{mock_webhook, received_payloads, request_count};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn inbox(workdir: &Path, args: &[&str]) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_inbox"))
        .args(args)
        .current_dir(workdir)
        .env("INBOX_STORAGE_PATH", workdir.join("inbox.db"))
        .env("INBOX_DEVICE", "e2e")
        .env("INBOX_DELIVERY_TIMEOUT_SECONDS", "2")
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("failed to run inbox binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

async fn add_webhook(workdir: &Path, name: &str, url: &str, category: &str) {
    let output = inbox(workdir, &[
        "webhook",
        "add",
        "--name",
        name,
        "--url",
        url,
        "--header",
        "X-Source=inbox",
        "--category",
        category,
    ])
    .await;
    assert!(output.status.success(), "webhook add failed: {}", stderr(&output));
}

#[tokio::test]
async fn note_is_delivered_and_listed() {
    let server = MockServer::start().await;
    mock_webhook(&server, "/notes", 200, Some(1)).await;
    let workdir = TempDir::new().unwrap();
    add_webhook(workdir.path(), "Notes", &format!("{}/notes", server.uri()), "note").await;

    let output = inbox(workdir.path(), &["note", "  call the plumber  ", "--title", "todo"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("delivered to 1 of 1 webhooks"));
    assert!(stdout(&output).contains(&format!("ok    {}/notes (HTTP 200", server.uri())));

    let payloads = received_payloads(&server, "/notes").await;
    assert_eq!(payloads[0]["type"], "note");
    assert_eq!(payloads[0]["data"], "call the plumber");
    assert_eq!(payloads[0]["title"], "todo");
    assert_eq!(payloads[0]["device"], "e2e");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].headers.get("x-source").unwrap(), "inbox");

    let items = inbox(workdir.path(), &["items"]).await;
    assert!(stdout(&items).contains("success"));
    assert!(stdout(&items).contains("todo"));
}

#[tokio::test]
async fn photo_capture_only_reaches_photo_webhooks() {
    let server = MockServer::start().await;
    mock_webhook(&server, "/photos", 200, Some(1)).await;
    mock_webhook(&server, "/notes", 200, Some(0)).await;
    let workdir = TempDir::new().unwrap();
    add_webhook(workdir.path(), "Photos", &format!("{}/photos", server.uri()), "photo").await;
    add_webhook(workdir.path(), "Notes", &format!("{}/notes", server.uri()), "note").await;
    let image = workdir.path().join("shot.jpg");
    std::fs::write(&image, [0xff, 0xd8, 0xff]).unwrap();

    let output =
        inbox(workdir.path(), &["capture", "photo", image.to_str().unwrap(), "-t", "shot"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let payloads = received_payloads(&server, "/photos").await;
    assert_eq!(payloads[0]["type"], "photo");
    assert_eq!(payloads[0]["data"], "/9j/");
}

#[tokio::test]
async fn failed_items_are_retried_up_to_the_limit() {
    let server = MockServer::start().await;
    mock_webhook(&server, "/down", 503, None).await;
    let workdir = TempDir::new().unwrap();
    add_webhook(workdir.path(), "Down", &format!("{}/down", server.uri()), "all").await;

    let output = inbox(workdir.path(), &["note", "ping"]).await;
    assert!(output.status.success(), "delivery failures must not fail the command");
    assert!(stdout(&output).contains("failed on all 1 webhooks"));

    inbox(workdir.path(), &["refresh"]).await;
    inbox(workdir.path(), &["refresh"]).await;
    let capped = inbox(workdir.path(), &["refresh"]).await;

    assert!(stdout(&capped).contains("Nothing to retry"));
    assert_eq!(request_count(&server, "/down").await, 3);

    let failed = inbox(workdir.path(), &["items", "--failed"]).await;
    assert!(stdout(&failed).contains("retries=3"));
}

#[tokio::test]
async fn invalid_webhook_is_rejected_with_form_message() {
    let workdir = TempDir::new().unwrap();

    let output = inbox(workdir.path(), &[
        "webhook",
        "add",
        "--name",
        "Legacy",
        "--url",
        "ftp://example.com",
        "--category",
        "all",
    ])
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("URL must start with http:// or https://"));

    let list = inbox(workdir.path(), &["webhook", "list"]).await;
    assert!(stdout(&list).contains("No webhooks configured"));
}

#[tokio::test]
async fn blank_note_is_rejected() {
    let workdir = TempDir::new().unwrap();

    let output = inbox(workdir.path(), &["note", "   "]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Note cannot be empty"));
}

#[tokio::test]
async fn listing_items_runs_the_mount_sweep() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mock_webhook(&server, "/flaky", 200, Some(1)).await;
    let workdir = TempDir::new().unwrap();
    add_webhook(workdir.path(), "Flaky", &format!("{}/flaky", server.uri()), "note").await;

    let saved = inbox(workdir.path(), &["note", "second time lucky"]).await;
    assert!(stdout(&saved).contains("failed on all 1 webhooks"));
    assert!(stdout(&saved).contains("fail  "));

    let items = inbox(workdir.path(), &["items"]).await;

    assert!(items.status.success(), "{}", stderr(&items));
    let listing = stdout(&items);
    assert!(listing.contains("Retried 1 items: 1 succeeded, 0 failed"));
    assert!(listing.contains("success"));
    assert!(listing.contains("retries=1"));
}
