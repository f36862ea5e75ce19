//! In-memory store of active vanity monitors.
//!
//! The store owns the uniqueness invariant: at most one entry per
//! [`MonitorKey`]. It is shared between the command layer and the scheduler,
//! which never holds the lock across a network call; each tick works from a
//! [`snapshot`](MonitorStore::snapshot) instead.
//!
//! # Thread Safety
//!
//! The store uses a `RwLock` internally, making it safe to share across
//! tokio tasks. The `Arc` wrapper allows cheap cloning into the scheduler,
//! the command layer, and the health endpoint.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::{MonitorEntry, MonitorKey, Scope};

/// Result of an owner-checked removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The entry was removed; the prior record is returned.
    Removed(MonitorEntry),
    /// The key exists but belongs to a different requester. No change.
    NotOwner,
    /// No entry exists for the key.
    NotMonitoring,
}

/// Shared map of monitor key to monitoring record.
///
/// Entries are kept in insertion order, which is the order `list` and
/// `snapshot` report.
#[derive(Debug, Clone, Default)]
pub struct MonitorStore {
    inner: Arc<RwLock<Vec<MonitorEntry>>>,
}

impl MonitorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry if its key is absent.
    ///
    /// Returns `false` when the key is already monitored. An existing
    /// monitor is never overwritten, even for a different requester:
    /// ownership of a key is first-come.
    pub async fn add(&self, entry: MonitorEntry) -> bool {
        let key = entry.key();
        let mut entries = self.inner.write().await;

        if entries.iter().any(|e| e.key() == key) {
            return false;
        }

        entries.push(entry);
        true
    }

    /// Removes the entry for `key`, returning the prior record if present.
    pub async fn remove(&self, key: &MonitorKey) -> Option<MonitorEntry> {
        let mut entries = self.inner.write().await;
        let index = entries.iter().position(|e| &e.key() == key)?;
        Some(entries.remove(index))
    }

    /// Removes the entry for `key` only if `requester_id` registered it.
    pub async fn remove_owned(&self, key: &MonitorKey, requester_id: &str) -> RemoveOutcome {
        let mut entries = self.inner.write().await;

        let Some(index) = entries.iter().position(|e| &e.key() == key) else {
            return RemoveOutcome::NotMonitoring;
        };

        if entries[index].requester_id != requester_id {
            return RemoveOutcome::NotOwner;
        }

        RemoveOutcome::Removed(entries.remove(index))
    }

    /// Returns a copy of the entry for `key`, if present.
    pub async fn get(&self, key: &MonitorKey) -> Option<MonitorEntry> {
        let entries = self.inner.read().await;
        entries.iter().find(|e| &e.key() == key).cloned()
    }

    /// Returns the entries registered by `requester_id` within `scope`,
    /// in insertion order.
    pub async fn list(&self, scope: &Scope, requester_id: &str) -> Vec<MonitorEntry> {
        let entries = self.inner.read().await;
        entries
            .iter()
            .filter(|e| &e.scope == scope && e.requester_id == requester_id)
            .cloned()
            .collect()
    }

    /// Returns a point-in-time copy of all entries with their keys.
    ///
    /// The scheduler iterates this copy so the lock is released before any
    /// availability check runs.
    pub async fn snapshot(&self) -> Vec<(MonitorKey, MonitorEntry)> {
        let entries = self.inner.read().await;
        entries.iter().map(|e| (e.key(), e.clone())).collect()
    }

    /// Replaces the full contents of the store (load path).
    pub async fn replace_all(&self, new_entries: Vec<MonitorEntry>) {
        let mut entries = self.inner.write().await;
        *entries = new_entries;
    }

    /// Returns the number of monitored entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` if nothing is monitored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VanityCode;

    fn entry(scope: &str, requester: &str, code: &str) -> MonitorEntry {
        MonitorEntry::new(
            Scope::from_raw(scope),
            requester.to_string(),
            "chan-1".to_string(),
            VanityCode::parse(code).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_add_then_get_returns_entry() {
        let store = MonitorStore::new();
        let e = entry("123", "alice", "demo");

        assert!(store.add(e.clone()).await);

        let found = store.get(&e.key()).await.expect("entry should exist");
        assert_eq!(found.requester_id, "alice");
        assert_eq!(found.code.as_str(), "demo");
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected_and_preserves_original() {
        let store = MonitorStore::new();
        let original = entry("123", "alice", "demo");
        let duplicate = entry("123", "bob", "demo");

        assert!(store.add(original).await);
        assert!(!store.add(duplicate).await);

        let found = store.get(&entry("123", "alice", "demo").key()).await.unwrap();
        assert_eq!(found.requester_id, "alice");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_code_in_different_scopes_is_independent() {
        let store = MonitorStore::new();

        assert!(store.add(entry("123", "alice", "demo")).await);
        assert!(store.add(entry("456", "alice", "demo")).await);
        assert!(store.add(entry("dm", "alice", "demo")).await);

        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_remove_returns_prior_entry() {
        let store = MonitorStore::new();
        let e = entry("123", "alice", "demo");
        store.add(e.clone()).await;

        let removed = store.remove(&e.key()).await.expect("entry should exist");
        assert_eq!(removed.requester_id, "alice");
        assert!(store.get(&e.key()).await.is_none());
        assert!(store.remove(&e.key()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_owned_rejects_other_requester() {
        let store = MonitorStore::new();
        let e = entry("123", "alice", "demo");
        store.add(e.clone()).await;

        let outcome = store.remove_owned(&e.key(), "bob").await;
        assert_eq!(outcome, RemoveOutcome::NotOwner);
        assert!(store.get(&e.key()).await.is_some());

        let outcome = store.remove_owned(&e.key(), "alice").await;
        assert!(matches!(outcome, RemoveOutcome::Removed(_)));
        assert!(store.get(&e.key()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_owned_missing_key() {
        let store = MonitorStore::new();
        let e = entry("123", "alice", "demo");

        let outcome = store.remove_owned(&e.key(), "alice").await;
        assert_eq!(outcome, RemoveOutcome::NotMonitoring);
    }

    #[tokio::test]
    async fn test_list_filters_by_scope_and_requester() {
        let store = MonitorStore::new();
        store.add(entry("123", "alice", "first")).await;
        store.add(entry("123", "bob", "second")).await;
        store.add(entry("456", "alice", "third")).await;
        store.add(entry("123", "alice", "fourth")).await;

        let listed = store.list(&Scope::from_raw("123"), "alice").await;
        let codes: Vec<&str> = listed.iter().map(|e| e.code.as_str()).collect();

        // Insertion order, scoped to (123, alice)
        assert_eq!(codes, vec!["first", "fourth"]);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_point_in_time_copy() {
        let store = MonitorStore::new();
        let e = entry("123", "alice", "demo");
        store.add(e.clone()).await;

        let snapshot = store.snapshot().await;
        store.remove(&e.key()).await;

        // The snapshot is unaffected by the removal.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, e.key());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_all_overwrites_contents() {
        let store = MonitorStore::new();
        store.add(entry("123", "alice", "old")).await;

        store
            .replace_all(vec![entry("456", "bob", "new-one"), entry("dm", "eve", "new-two")])
            .await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&entry("123", "alice", "old").key()).await.is_none());
    }
}
