//! Durable persistence for the monitor store.
//!
//! State is a single JSON file with an explicit schema version:
//!
//! ```json
//! {
//!   "version": 2,
//!   "monitors": {
//!     "123456789_cool-guild": {
//!       "requesterId": "...",
//!       "channelId": "...",
//!       "guildId": "123456789",
//!       "vanityUrl": "cool-guild",
//!       "addedAt": "2024-01-01T00:00:00Z"
//!     }
//!   }
//! }
//! ```
//!
//! # Design
//!
//! - **Whole-file writes**: every save serializes the full store and
//!   replaces the file via a temp file + atomic rename. The in-memory store
//!   stays authoritative if a save fails; the gap is bounded by the next
//!   successful save.
//!
//! - **Versioned reader**: files without a top-level `version` field are the
//!   legacy schema (keyed by bare vanity code, scope optional in the value).
//!   [`migrate_v1`] is a pure function that rewrites every legacy entry to
//!   the composite `{scope}_{code}` keying; the result is written back
//!   immediately, so a second load sees native v2 data.
//!
//! - **Quarantine**: entries whose key disagrees with their embedded fields
//!   are logged at error level and dropped, never silently trusted.
//!
//! A missing file is a normal empty start. An unparseable file is a
//! [`PersistenceError::Corrupt`] that callers must not swallow.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::store::MonitorStore;
use crate::types::{MonitorEntry, MonitorKey, Scope};

/// Current schema version written by [`StatePersister::save`].
const SCHEMA_VERSION: u32 = 2;

/// Persisted sentinel scope for direct-message monitors (legacy default).
const DM_SCOPE: &str = "dm";

/// Errors that can occur while loading or saving the state file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid JSON in any known schema.
    #[error("state file is corrupt: {0}")]
    Corrupt(String),

    /// The file declares a schema version newer than this build understands.
    #[error("unsupported state file version {version} (newest supported is {SCHEMA_VERSION})")]
    UnsupportedVersion { version: u32 },

    /// Serializing the store to JSON failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Versioned on-disk representation.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    monitors: BTreeMap<String, RawEntry>,
}

/// Permissive on-disk entry shape.
///
/// `guildId`, `vanityUrl`, and `addedAt` are optional so legacy values can
/// be read; [`migrate_v1`] fills them in and the v2 reader requires them to
/// agree with the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    requester_id: String,
    channel_id: String,
    #[serde(rename = "guildId", default, skip_serializing_if = "Option::is_none")]
    guild_id: Option<String>,
    #[serde(rename = "vanityUrl", default, skip_serializing_if = "Option::is_none")]
    vanity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_at: Option<DateTime<Utc>>,
}

/// Rewrites a legacy (v1) monitor map to the composite-key v2 schema.
///
/// Legacy entries are keyed by bare vanity code; the scope comes from the
/// value's embedded `guildId` when present and defaults to the DM sentinel
/// otherwise. Entries already keyed `{scope}_{code}` pass through with
/// their embedded fields filled in, so migrating migrated data is a no-op.
fn migrate_v1(legacy: BTreeMap<String, RawEntry>) -> BTreeMap<String, RawEntry> {
    let mut migrated = BTreeMap::new();

    for (key, mut raw) in legacy {
        let (scope, code) = match key.split_once('_') {
            // Already composite: the key wins over any embedded fields.
            Some((scope, code)) => (scope.to_string(), code.to_string()),
            // Bare vanity code: scope from the value, defaulting to DM.
            None => {
                let scope = raw.guild_id.clone().unwrap_or_else(|| DM_SCOPE.to_string());
                (scope, key)
            }
        };

        raw.guild_id = Some(scope.clone());
        raw.vanity_url = Some(code.clone());
        raw.added_at = Some(raw.added_at.unwrap_or_else(Utc::now));

        migrated.insert(format!("{scope}_{code}"), raw);
    }

    migrated
}

/// Converts a v2 monitor map into store entries, quarantining bad entries.
///
/// An entry is quarantined (logged and dropped) when its key cannot be
/// parsed or its embedded `guildId`/`vanityUrl` disagree with the key.
fn entries_from_monitors(monitors: BTreeMap<String, RawEntry>) -> Vec<MonitorEntry> {
    let mut entries = Vec::with_capacity(monitors.len());

    for (raw_key, raw) in monitors {
        let key = match MonitorKey::parse(&raw_key) {
            Ok(key) => key,
            Err(err) => {
                error!(key = %raw_key, error = %err, "Quarantining entry with unparseable key");
                continue;
            }
        };

        let embedded_scope = raw.guild_id.as_deref().map(Scope::from_raw);
        if embedded_scope.as_ref() != Some(&key.scope) {
            error!(key = %raw_key, "Quarantining entry whose guildId disagrees with its key");
            continue;
        }

        if raw.vanity_url.as_deref() != Some(key.code.as_str()) {
            error!(key = %raw_key, "Quarantining entry whose vanityUrl disagrees with its key");
            continue;
        }

        let Some(added_at) = raw.added_at else {
            error!(key = %raw_key, "Quarantining entry with no addedAt timestamp");
            continue;
        };

        entries.push(MonitorEntry {
            requester_id: raw.requester_id,
            channel_id: raw.channel_id,
            scope: key.scope,
            code: key.code,
            added_at,
        });
    }

    entries
}

/// Builds the on-disk map from store entries.
fn monitors_from_entries(entries: &[(MonitorKey, MonitorEntry)]) -> BTreeMap<String, RawEntry> {
    entries
        .iter()
        .map(|(key, entry)| {
            (
                key.to_string(),
                RawEntry {
                    requester_id: entry.requester_id.clone(),
                    channel_id: entry.channel_id.clone(),
                    guild_id: Some(entry.scope.as_str().to_string()),
                    vanity_url: Some(entry.code.as_str().to_string()),
                    added_at: Some(entry.added_at),
                },
            )
        })
        .collect()
}

/// Handle for loading and saving the state file.
///
/// Saves are serialized through an internal async mutex so two writers
/// never interleave their writes to the same file.
#[derive(Debug, Clone)]
pub struct StatePersister {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl StatePersister {
    /// Creates a persister for the given state file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state file, migrating the legacy schema if found.
    ///
    /// A missing file yields an empty entry list. A legacy file is migrated
    /// and written back in the v2 schema before this method returns.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Corrupt`] when the file exists but cannot
    /// be parsed, and [`PersistenceError::UnsupportedVersion`] for files
    /// written by a newer build.
    pub async fn load(&self) -> Result<Vec<MonitorEntry>, PersistenceError> {
        let contents = match std::fs::read_to_string(self.path.as_ref()) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(PersistenceError::Io(err)),
        };

        let value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;

        // Only a numeric top-level `version` marks the current schema. A
        // legacy file can legitimately hold a monitor keyed `version`, in
        // which case the value is an object, not a number.
        let monitors = if value.get("version").is_some_and(serde_json::Value::is_u64) {
            let state: StateFile = serde_json::from_value(value)
                .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;

            if state.version != SCHEMA_VERSION {
                return Err(PersistenceError::UnsupportedVersion {
                    version: state.version,
                });
            }

            state.monitors
        } else {
            // No version marker: legacy schema. Migrate and persist the
            // result so the next load sees native v2 data.
            let legacy: BTreeMap<String, RawEntry> = serde_json::from_value(value)
                .map_err(|err| PersistenceError::Corrupt(err.to_string()))?;

            warn!(
                path = %self.path.display(),
                entries = legacy.len(),
                "Legacy state file detected, migrating to versioned schema"
            );

            let migrated = migrate_v1(legacy);
            self.write_monitors(&migrated).await?;

            info!(entries = migrated.len(), "State file migration complete");
            migrated
        };

        Ok(entries_from_monitors(monitors))
    }

    /// Serializes the full store to the state file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file cannot be written.
    /// Callers log the failure and keep running; the in-memory store stays
    /// authoritative until the next successful save.
    pub async fn save(&self, store: &MonitorStore) -> Result<(), PersistenceError> {
        let snapshot = store.snapshot().await;
        let monitors = monitors_from_entries(&snapshot);
        self.write_monitors(&monitors).await
    }

    /// Writes a monitor map as a v2 state file via temp file + rename.
    async fn write_monitors(
        &self,
        monitors: &BTreeMap<String, RawEntry>,
    ) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let state = StateFile {
            version: SCHEMA_VERSION,
            monitors: monitors.clone(),
        };
        let json = serde_json::to_vec_pretty(&state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, self.path.as_ref())?;

        Ok(())
    }
}
