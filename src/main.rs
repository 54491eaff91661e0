//! Inbox webhook relay.
//!
//! Entry point for the `inbox` binary. Loads configuration, opens the
//! local store, and runs one command against it.
//!
//! Listing items counts as opening the inbox screen, so `items` runs the
//! mount-time retry sweep before printing. `watch` sweeps on start and then
//! periodically.

mod cli;
mod progress;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use inbox_app::{Capture, Config, InboxApp};
use inbox_core::{ContentItem, EventHandler, WebhookConfig};
use inbox_delivery::{DispatchOutcome, SweepReport};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    cli::{CaptureCommand, Cli, Command, WebhookCommand},
    progress::ProgressReporter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config.log_level, cli.verbose)?;

    info!(
        storage_path = %config.storage_path.display(),
        device = %config.device,
        max_automatic_retries = config.max_automatic_retries,
        "Configuration loaded"
    );

    let app = InboxApp::open(&config, vec![Arc::new(ProgressReporter) as Arc<dyn EventHandler>])
        .await
        .context("Failed to open inbox storage")?;

    let result = run(&app, cli.command).await;
    app.close().await;
    result
}

async fn run(app: &InboxApp, command: Command) -> Result<()> {
    match command {
        Command::Webhook(command) => run_webhook(app, command).await?,
        Command::Capture(command) => {
            let (args, capture) = match command {
                CaptureCommand::Photo(args) => {
                    let bytes = read_image(&args.file).await?;
                    let capture = app.capture_photo(&bytes, args.title.as_deref()).await;
                    (args, capture)
                },
                CaptureCommand::Gallery(args) => {
                    let bytes = read_image(&args.file).await?;
                    let capture = app.pick_gallery_image(&bytes, args.title.as_deref()).await;
                    (args, capture)
                },
            };
            println!("{}: {}", args.file.display(), describe_capture(&capture));
        },
        Command::Note { text, title } => {
            let capture = app.save_note(&text, title.as_deref()).await?;
            println!("{}", describe_capture(&capture));
        },
        Command::Items { failed } => {
            let report = app.on_mount().await;
            if !report.is_empty() {
                println!("{}", describe_report(&report));
            }
            let items = if failed { app.failed_items().await } else { app.items().await };
            if items.is_empty() {
                println!("No items");
            }
            for item in &items {
                println!("{}", format_item(item));
            }
        },
        Command::Retry { id } => {
            let outcome = app.retry_item(id).await;
            println!("{id}: {}", describe_outcome(outcome));
        },
        Command::Refresh => {
            let report = app.refresh().await;
            println!("{}", describe_report(&report));
        },
        Command::Delete { id } => match app.delete_item(id).await {
            Some(_) => println!("Deleted {id}"),
            None => anyhow::bail!("no item with id {id}"),
        },
        Command::Clear => {
            app.clear_items().await;
            println!("All items cleared");
        },
        Command::Watch => watch(app).await,
    }

    Ok(())
}

async fn run_webhook(app: &InboxApp, command: WebhookCommand) -> Result<()> {
    match command {
        WebhookCommand::Add(args) => {
            let id = app.add_webhook(args.into()).await?;
            println!("Added webhook {id}");
        },
        WebhookCommand::List => {
            let webhooks = app.webhooks().await;
            if webhooks.is_empty() {
                println!("No webhooks configured");
            }
            for webhook in &webhooks {
                println!("{}", format_webhook(webhook));
            }
        },
        WebhookCommand::Update { id, changes } => {
            let existing = app
                .webhooks()
                .await
                .into_iter()
                .find(|webhook| webhook.id == id)
                .with_context(|| format!("no webhook with id {id}"))?;
            let updated = app
                .update_webhook(id, changes.apply_to(existing))
                .await?
                .with_context(|| format!("no webhook with id {id}"))?;
            println!("{}", format_webhook(&updated));
        },
        WebhookCommand::Toggle { id } => {
            let webhook =
                app.toggle_webhook(id).await.with_context(|| format!("no webhook with id {id}"))?;
            println!("{}", format_webhook(&webhook));
        },
        WebhookCommand::Delete { id } => {
            app.delete_webhook(id).await.with_context(|| format!("no webhook with id {id}"))?;
            println!("Deleted webhook {id}");
        },
    }

    Ok(())
}

/// Runs the periodic sweeper until a shutdown signal arrives.
async fn watch(app: &InboxApp) {
    let cancellation_token = CancellationToken::new();
    let sweeper = app.run_sweeper(cancellation_token.clone());
    tokio::pin!(sweeper);

    info!("Watching for failed uploads, press Ctrl+C to stop");

    tokio::select! {
        () = &mut sweeper => {},
        () = shutdown_signal() => {
            info!("Shutdown signal received, finishing current sweep");
            cancellation_token.cancel();
            sweeper.await;
        },
    }

    info!("Sweeper stopped");
}

async fn read_image(path: &std::path::Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.with_context(|| format!("Failed to read {}", path.display()))
}

fn describe_capture(capture: &Capture) -> String {
    format!("{} {}", capture.id, describe_outcome(capture.outcome))
}

fn describe_outcome(outcome: DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::ContentNotFound => "not found".to_string(),
        DispatchOutcome::NoApplicableWebhooks => "stored, no matching webhooks".to_string(),
        DispatchOutcome::Delivered { succeeded, failed } => {
            format!("delivered to {succeeded} of {} webhooks", succeeded + failed)
        },
        DispatchOutcome::AllFailed { failed } => format!("failed on all {failed} webhooks"),
    }
}

fn describe_report(report: &SweepReport) -> String {
    if report.is_empty() {
        return "Nothing to retry".to_string();
    }
    format!(
        "Retried {} items: {} succeeded, {} failed",
        report.attempted.len(),
        report.succeeded,
        report.failed
    )
}

fn format_item(item: &ContentItem) -> String {
    let label = item.title.clone().unwrap_or_else(|| {
        if item.kind.is_image() {
            format!("{} bytes of base64", item.data.len())
        } else {
            item.data.chars().take(40).collect()
        }
    });
    format!(
        "{}  {:<7} {:<9} retries={}  {}",
        item.id,
        item.kind.as_str(),
        item.upload_status.to_string(),
        item.retry_count,
        label
    )
}

fn format_webhook(webhook: &WebhookConfig) -> String {
    let categories: Vec<&str> = webhook.categories.iter().map(|c| c.as_str()).collect();
    format!(
        "{}  {:<8} {}  {}  [{}]",
        webhook.id,
        if webhook.enabled { "enabled" } else { "disabled" },
        webhook.name,
        webhook.url,
        categories.join(", ")
    )
}

/// Initializes tracing. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str, verbose: u8) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match verbose {
        0 => log_level,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level `{level}`"))?;

    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing")
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        () = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
