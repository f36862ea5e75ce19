//! Configuration for the vanitywatch daemon.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `VANITYWATCH_BOT_TOKEN` | Yes | - | Bot token for the notification channel |
//! | `VANITYWATCH_STATE_FILE` | No | `~/.vanitywatch/monitors.json` | Durable state file path |
//! | `VANITYWATCH_CHECK_INTERVAL_SECS` | No | 30 | Seconds between availability ticks |
//! | `VANITYWATCH_REQUEST_TIMEOUT_SECS` | No | 5 | Per-call timeout for remote requests |
//! | `VANITYWATCH_API_BASE` | No | `https://discord.com/api/v10` | Discord REST base URL |
//! | `VANITYWATCH_PORT` | No | 8080 | Liveness endpoint port |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

/// Default tick interval in seconds.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

/// Default per-call timeout for checker and notifier requests.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default Discord REST API base.
const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Default liveness endpoint port.
const DEFAULT_PORT: u16 = 8080;

/// Default state directory name relative to home.
const DEFAULT_STATE_DIR: &str = ".vanitywatch";

/// Default state file name.
const DEFAULT_STATE_FILE: &str = "monitors.json";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the vanitywatch daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token used by the notifier.
    pub bot_token: String,

    /// Path to the durable state file.
    pub state_file: PathBuf,

    /// Seconds between availability ticks.
    pub check_interval_secs: u64,

    /// Per-call timeout for checker and notifier requests, in seconds.
    pub request_timeout_secs: u64,

    /// Discord REST API base URL.
    pub api_base: String,

    /// Port the liveness endpoint listens on.
    pub port: u16,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `VANITYWATCH_BOT_TOKEN` is not set
    /// - A numeric variable is set but cannot be parsed or is zero
    /// - The home directory cannot be determined (needed for the default
    ///   state file path)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Required: VANITYWATCH_BOT_TOKEN
        let bot_token = env::var("VANITYWATCH_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("VANITYWATCH_BOT_TOKEN".to_string()))?;

        // Optional: VANITYWATCH_STATE_FILE (default: ~/.vanitywatch/monitors.json)
        let state_file = match env::var("VANITYWATCH_STATE_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs
                    .home_dir()
                    .join(DEFAULT_STATE_DIR)
                    .join(DEFAULT_STATE_FILE)
            }
        };

        let check_interval_secs = parse_positive_secs(
            "VANITYWATCH_CHECK_INTERVAL_SECS",
            DEFAULT_CHECK_INTERVAL_SECS,
        )?;
        let request_timeout_secs = parse_positive_secs(
            "VANITYWATCH_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        // Optional: VANITYWATCH_API_BASE (default: Discord v10, trailing slash trimmed)
        let api_base = env::var("VANITYWATCH_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        // Optional: VANITYWATCH_PORT (default: 8080)
        let port = match env::var("VANITYWATCH_PORT") {
            Ok(val) => val.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "VANITYWATCH_PORT".to_string(),
                message: format!("expected port number, got '{val}'"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            bot_token,
            state_file,
            check_interval_secs,
            request_timeout_secs,
            api_base,
            port,
        })
    }

    /// Tick interval as a [`Duration`].
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Per-call request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses an optional positive-seconds variable with a default.
fn parse_positive_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let secs = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected positive integer, got '{val}'"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1 second".to_string(),
                });
            }
            Ok(secs)
        }
        Err(_) => Ok(default),
    }
}
