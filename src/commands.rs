//! Command intents against the monitor store.
//!
//! The chat front-end parses user text elsewhere and hands this module an
//! [`CommandIntent`]; the handler applies it to the store, persists mutating
//! outcomes, and returns a [`CommandOutcome`] for the front-end to render.
//!
//! Persistence is synchronous relative to the mutation: `handle` waits for
//! the save before returning. A failed save is logged and the in-memory
//! store stays authoritative until the next successful save.

use tracing::warn;

use crate::persistence::StatePersister;
use crate::store::{MonitorStore, RemoveOutcome};
use crate::types::{MonitorEntry, MonitorKey, Scope, ValidationError, VanityCode};

/// A user intent produced by the chat command layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    /// Start monitoring a vanity code.
    Add {
        scope: Scope,
        requester_id: String,
        channel_id: String,
        code: String,
    },
    /// Stop monitoring a vanity code.
    Remove {
        scope: Scope,
        requester_id: String,
        code: String,
    },
    /// List the requester's monitors in this scope.
    List { scope: Scope, requester_id: String },
}

/// Result of applying an intent, rendered by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The monitor was registered.
    Added(MonitorEntry),
    /// The key is already monitored; the existing monitor is untouched.
    AlreadyMonitored,
    /// The monitor was removed.
    Removed(MonitorEntry),
    /// The key exists but belongs to another requester.
    NotOwner,
    /// Nothing is monitoring that code in this scope.
    NotMonitoring,
    /// The code failed validation before touching the store.
    InvalidCode(ValidationError),
    /// The requester's monitors in this scope, insertion order.
    Monitors(Vec<MonitorEntry>),
}

/// Applies command intents to the shared store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: MonitorStore,
    persister: StatePersister,
}

impl CommandHandler {
    /// Creates a handler over the shared store and persister.
    #[must_use]
    pub fn new(store: MonitorStore, persister: StatePersister) -> Self {
        Self { store, persister }
    }

    /// Applies one intent and returns the outcome.
    pub async fn handle(&self, intent: CommandIntent) -> CommandOutcome {
        match intent {
            CommandIntent::Add {
                scope,
                requester_id,
                channel_id,
                code,
            } => {
                let code = match VanityCode::parse(&code) {
                    Ok(code) => code,
                    Err(err) => return CommandOutcome::InvalidCode(err),
                };

                let entry = MonitorEntry::new(scope, requester_id, channel_id, code);
                if !self.store.add(entry.clone()).await {
                    return CommandOutcome::AlreadyMonitored;
                }

                self.persist().await;
                CommandOutcome::Added(entry)
            }

            CommandIntent::Remove {
                scope,
                requester_id,
                code,
            } => {
                let code = match VanityCode::parse(&code) {
                    Ok(code) => code,
                    Err(err) => return CommandOutcome::InvalidCode(err),
                };

                let key = MonitorKey::new(scope, code);
                match self.store.remove_owned(&key, &requester_id).await {
                    RemoveOutcome::Removed(entry) => {
                        self.persist().await;
                        CommandOutcome::Removed(entry)
                    }
                    RemoveOutcome::NotOwner => CommandOutcome::NotOwner,
                    RemoveOutcome::NotMonitoring => CommandOutcome::NotMonitoring,
                }
            }

            CommandIntent::List {
                scope,
                requester_id,
            } => CommandOutcome::Monitors(self.store.list(&scope, &requester_id).await),
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.persister.save(&self.store).await {
            warn!(error = %err, "Failed to persist store after command");
        }
    }
}
