//! Core types for vanity URL monitoring.
//!
//! This module defines the composite monitor key, the monitoring record, and
//! the validated vanity code newtype. All types serialize to the camelCase
//! JSON shape used by the persisted state file.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Persisted sentinel for monitors registered from a direct message.
const DM_SCOPE: &str = "dm";

/// Minimum length of a vanity code.
const MIN_CODE_LEN: usize = 2;

/// Errors produced while validating a vanity code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Code is shorter than the minimum length.
    #[error("vanity code must be at least {MIN_CODE_LEN} characters, got {length}")]
    TooShort { length: usize },

    /// Code contains characters outside `a-z`, `0-9`, and `-`.
    #[error("vanity code may only contain lowercase letters, digits, and hyphens")]
    InvalidCharacters,
}

/// Errors produced while parsing a persisted `{scope}_{code}` key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    /// Key has no scope/code separator (legacy schema).
    #[error("monitor key '{key}' has no scope separator")]
    MissingSeparator { key: String },

    /// Code component failed validation.
    #[error("monitor key '{key}' has an invalid code: {source}")]
    InvalidCode {
        key: String,
        #[source]
        source: ValidationError,
    },
}

/// The context a vanity code is monitored within.
///
/// Monitoring the same code in two different scopes is independent; a guild
/// scope carries the guild's snowflake ID and direct-message monitors share
/// a single sentinel scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A specific guild, identified by its snowflake ID.
    Guild(String),
    /// The direct-message context.
    DirectMessage,
}

impl Scope {
    /// Builds a scope from its persisted string form.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if raw == DM_SCOPE {
            Self::DirectMessage
        } else {
            Self::Guild(raw.to_string())
        }
    }

    /// Returns the persisted string form (`dm` or the guild ID).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Guild(id) => id,
            Self::DirectMessage => DM_SCOPE,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

/// A validated, normalized vanity code.
///
/// Construction lowercases and trims the input, then enforces the character
/// set (`a-z`, `0-9`, `-`) and minimum length. Invalid input never reaches
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VanityCode(String);

impl VanityCode {
    /// Normalizes and validates a raw code.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the normalized code is too short or
    /// contains characters outside the allowed set.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.len() < MIN_CODE_LEN {
            return Err(ValidationError::TooShort {
                length: normalized.len(),
            });
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidCharacters);
        }

        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VanityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VanityCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Composite key identifying one monitor: a scope plus a vanity code.
///
/// The store holds at most one record per key. The persisted form is
/// `{scope}_{code}`; guild IDs are numeric and the DM sentinel contains no
/// underscore, so the first `_` always splits scope from code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorKey {
    pub scope: Scope,
    pub code: VanityCode,
}

impl MonitorKey {
    /// Creates a key from its components.
    #[must_use]
    pub fn new(scope: Scope, code: VanityCode) -> Self {
        Self { scope, code }
    }

    /// Parses a persisted `{scope}_{code}` key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyParseError::MissingSeparator`] for keys with no
    /// underscore (the legacy schema) and [`KeyParseError::InvalidCode`]
    /// when the code component fails validation.
    pub fn parse(raw: &str) -> Result<Self, KeyParseError> {
        let (scope, code) = raw
            .split_once('_')
            .ok_or_else(|| KeyParseError::MissingSeparator {
                key: raw.to_string(),
            })?;

        let code = VanityCode::parse(code).map_err(|source| KeyParseError::InvalidCode {
            key: raw.to_string(),
            source,
        })?;

        Ok(Self::new(Scope::from_raw(scope), code))
    }
}

impl fmt::Display for MonitorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.scope, self.code)
    }
}

/// One monitored vanity code: who asked, where to notify, and when.
///
/// The `scope` and `code` fields always agree with the [`MonitorKey`] that
/// maps to the entry; the persistence layer quarantines entries where they
/// do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorEntry {
    /// Identity of the user that registered the monitor.
    pub requester_id: String,

    /// Channel the availability notice is delivered to.
    pub channel_id: String,

    /// Scope the monitor belongs to.
    #[serde(rename = "guildId")]
    pub scope: Scope,

    /// The monitored vanity code.
    #[serde(rename = "vanityUrl")]
    pub code: VanityCode,

    /// When the monitor was registered.
    pub added_at: DateTime<Utc>,
}

impl MonitorEntry {
    /// Creates an entry timestamped now.
    #[must_use]
    pub fn new(scope: Scope, requester_id: String, channel_id: String, code: VanityCode) -> Self {
        Self {
            requester_id,
            channel_id,
            scope,
            code,
            added_at: Utc::now(),
        }
    }

    /// Returns the key this entry is stored under.
    #[must_use]
    pub fn key(&self) -> MonitorKey {
        MonitorKey::new(self.scope.clone(), self.code.clone())
    }
}
