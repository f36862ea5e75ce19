//! Error types for vanitywatch.
//!
//! This module defines the crate-level error type, aggregating the
//! structured errors each subsystem produces.

use thiserror::Error;

use crate::config::ConfigError;
use crate::notifier::NotifyError;
use crate::persistence::PersistenceError;
use crate::types::ValidationError;

/// Errors that can occur during monitor operations.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed vanity code, rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// State file load or save failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Notification delivery failure.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
