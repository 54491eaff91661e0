//! Layered configuration for the inbox relay.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use inbox_delivery::{ClientConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Config file read from the working directory when none is given.
pub const CONFIG_FILE: &str = "inbox.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "INBOX_";

/// Relay configuration with defaults, file, and environment overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `INBOX_` (highest priority)
/// 2. Configuration file (`inbox.toml` or the path passed in)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```no_run
/// use inbox_app::Config;
///
/// let config = Config::load(None).expect("Failed to load configuration");
///
/// println!("Items are stored in {}", config.storage_path.display());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database holding both registries.
    ///
    /// Environment variable: `INBOX_STORAGE_PATH`
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Platform identifier sent as `device` in every payload.
    ///
    /// Environment variable: `INBOX_DEVICE`
    #[serde(default = "inbox_delivery::default_device")]
    pub device: String,

    /// HTTP request timeout for webhook delivery in seconds.
    ///
    /// Environment variable: `INBOX_DELIVERY_TIMEOUT_SECONDS`
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,

    /// User agent sent with webhook requests.
    ///
    /// Environment variable: `INBOX_USER_AGENT`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Redirects followed per request. Zero treats 3xx as final.
    ///
    /// Environment variable: `INBOX_MAX_REDIRECTS`
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Failures after which an item is only retried manually.
    ///
    /// Environment variable: `INBOX_MAX_AUTOMATIC_RETRIES`
    #[serde(default = "default_max_automatic_retries")]
    pub max_automatic_retries: u32,

    /// Seconds between sweeps in `watch` mode.
    ///
    /// Environment variable: `INBOX_SWEEP_INTERVAL_SECONDS`
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Environment variable: `INBOX_LOG_LEVEL`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Loads configuration from defaults, a config file, and environment
    /// overrides.
    ///
    /// Without `path`, `inbox.toml` is read if it exists. An explicit
    /// `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                anyhow::ensure!(path.exists(), "config file {} not found", path.display());
                path.to_path_buf()
            },
            None => PathBuf::from(CONFIG_FILE),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Client configuration for the webhook HTTP client.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.delivery_timeout_seconds),
            user_agent: self.user_agent.clone(),
            max_redirects: self.max_redirects,
        }
    }

    /// Automatic retry policy for the sweeper.
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_automatic_retries)
    }

    /// Interval between periodic sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Validates configuration values.
    pub fn validate(&self) -> std::result::Result<(), AppError> {
        if self.delivery_timeout_seconds == 0 {
            return Err(AppError::config("delivery_timeout_seconds must be greater than 0"));
        }

        if self.sweep_interval_seconds == 0 {
            return Err(AppError::config("sweep_interval_seconds must be greater than 0"));
        }

        if self.device.trim().is_empty() {
            return Err(AppError::config("device must not be empty"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(AppError::config("user_agent must not be empty"));
        }

        if self.storage_path.as_os_str().is_empty() {
            return Err(AppError::config("storage_path must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            device: inbox_delivery::default_device(),
            delivery_timeout_seconds: default_delivery_timeout(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            max_automatic_retries: default_max_automatic_retries(),
            sweep_interval_seconds: default_sweep_interval(),
            log_level: default_log_level(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("inbox.db")
}

fn default_delivery_timeout() -> u64 {
    inbox_delivery::DEFAULT_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    ClientConfig::default().user_agent
}

fn default_max_redirects() -> u32 {
    ClientConfig::default().max_redirects
}

fn default_max_automatic_retries() -> u32 {
    inbox_delivery::DEFAULT_MAX_AUTOMATIC_RETRIES
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}
