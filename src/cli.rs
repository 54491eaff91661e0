//! Command-line interface for the `inbox` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use inbox_app::WebhookForm;
use inbox_core::{Category, ContentId, WebhookConfig, WebhookId};

/// inbox - capture photos, gallery images and notes and relay them to webhooks
#[derive(Debug, Parser)]
#[command(name = "inbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (defaults to ./inbox.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage webhook destinations
    #[command(subcommand)]
    Webhook(WebhookCommand),

    /// Capture an image file and send it
    #[command(subcommand)]
    Capture(CaptureCommand),

    /// Save a note and send it
    Note {
        /// Note text
        text: String,

        /// Optional title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List captured items
    Items {
        /// Only show items whose last delivery failed
        #[arg(long)]
        failed: bool,
    },

    /// Resend one item, ignoring the automatic retry limit
    Retry {
        /// Item id
        id: ContentId,
    },

    /// Retry failed items once
    Refresh,

    /// Delete one item
    Delete {
        /// Item id
        id: ContentId,
    },

    /// Delete every item
    Clear,

    /// Retry failed items periodically until interrupted
    Watch,
}

/// Webhook management commands.
#[derive(Debug, Subcommand)]
pub enum WebhookCommand {
    /// Register a new webhook
    Add(WebhookArgs),

    /// List webhooks
    List,

    /// Change a webhook; omitted fields keep their value
    Update {
        /// Webhook id
        id: WebhookId,

        #[command(flatten)]
        changes: WebhookChanges,
    },

    /// Enable or disable a webhook
    Toggle {
        /// Webhook id
        id: WebhookId,
    },

    /// Delete a webhook
    Delete {
        /// Webhook id
        id: WebhookId,
    },
}

/// Image capture commands.
#[derive(Debug, Subcommand)]
pub enum CaptureCommand {
    /// Send a camera photo
    Photo(CaptureArgs),

    /// Send an image from the gallery
    Gallery(CaptureArgs),
}

/// Image file to capture.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Image file
    pub file: PathBuf,

    /// Optional title
    #[arg(short, long)]
    pub title: Option<String>,
}

/// Fields of a new webhook.
#[derive(Debug, Args)]
pub struct WebhookArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Destination URL (http:// or https://)
    #[arg(long)]
    pub url: String,

    /// Extra request header as KEY=VALUE (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Accepted category: photo, gallery, note or all (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<Category>,
}

impl From<WebhookArgs> for WebhookForm {
    fn from(args: WebhookArgs) -> Self {
        Self {
            name: args.name,
            url: args.url,
            headers: args.headers,
            categories: args.categories.into_iter().collect(),
        }
    }
}

/// Fields to change on an existing webhook.
#[derive(Debug, Args)]
pub struct WebhookChanges {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New destination URL
    #[arg(long)]
    pub url: Option<String>,

    /// Replacement headers as KEY=VALUE (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Remove all configured headers
    #[arg(long, conflicts_with = "headers")]
    pub clear_headers: bool,

    /// Replacement categories (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<Category>,
}

impl WebhookChanges {
    /// Builds a full form from `existing` with these changes applied.
    pub fn apply_to(self, existing: WebhookConfig) -> WebhookForm {
        let headers = if self.clear_headers {
            Vec::new()
        } else if self.headers.is_empty() {
            existing.headers.into_iter().collect()
        } else {
            self.headers
        };
        let categories = if self.categories.is_empty() {
            existing.categories
        } else {
            self.categories.into_iter().collect()
        };

        WebhookForm {
            name: self.name.unwrap_or(existing.name),
            url: self.url.unwrap_or(existing.url),
            headers,
            categories,
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}
