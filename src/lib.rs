//! Vanitywatch - Discord vanity URL availability monitor.
//!
//! This crate tracks vanity invite codes users want to claim once they free
//! up. A fixed-interval scheduler polls the Discord invite endpoint for
//! every monitored code; when a code transitions from taken to available,
//! exactly one notification is delivered to the channel that registered it,
//! the entry is removed, and the state file is rewritten.
//!
//! # Overview
//!
//! - [`store`]: shared keyed map of active monitors (uniqueness invariant)
//! - [`persistence`]: versioned JSON state file with legacy-schema migration
//! - [`scheduler`]: the periodic check / notify / remove / save loop
//! - [`checker`]: tri-state availability check against the invite endpoint
//! - [`notifier`]: one-shot availability notices over the Discord REST API
//! - [`commands`]: add/remove/list intents from the chat front-end
//! - [`health`]: read-only liveness endpoint
//! - [`types`]: scope, vanity code, monitor key and record
//! - [`config`]: configuration from environment variables
//! - [`error`]: crate-level error type

pub mod checker;
pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod notifier;
pub mod persistence;
pub mod scheduler;
pub mod store;
pub mod types;

pub use checker::{Availability, InviteChecker, VanityChecker};
pub use commands::{CommandHandler, CommandIntent, CommandOutcome};
pub use config::Config;
pub use error::{MonitorError, Result};
pub use notifier::{DiscordNotifier, Notifier, NotifyError};
pub use persistence::{PersistenceError, StatePersister};
pub use scheduler::Scheduler;
pub use store::{MonitorStore, RemoveOutcome};
pub use types::{MonitorEntry, MonitorKey, Scope, ValidationError, VanityCode};
