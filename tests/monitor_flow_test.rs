//! End-to-end monitor flow tests.
//!
//! Exercises the command layer, persistence, and scheduler together the way
//! the daemon wires them, with in-process fakes standing in for the Discord
//! endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use vanitywatch::checker::{Availability, VanityChecker};
use vanitywatch::commands::{CommandHandler, CommandIntent, CommandOutcome};
use vanitywatch::notifier::{Notifier, NotifyError};
use vanitywatch::persistence::StatePersister;
use vanitywatch::scheduler::Scheduler;
use vanitywatch::store::MonitorStore;
use vanitywatch::types::{MonitorEntry, Scope, VanityCode};

/// Checker backed by a fixed availability table.
struct TableChecker {
    table: HashMap<String, Availability>,
}

#[async_trait]
impl VanityChecker for TableChecker {
    async fn check(&self, code: &VanityCode) -> Availability {
        *self.table.get(code.as_str()).unwrap_or(&Availability::Taken)
    }
}

/// Notifier that records delivered entries.
#[derive(Default)]
struct RecordingNotifier {
    delivered: Mutex<Vec<MonitorEntry>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, entry: &MonitorEntry) -> Result<(), NotifyError> {
        self.delivered.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

fn add_intent(scope: &str, requester: &str, code: &str) -> CommandIntent {
    CommandIntent::Add {
        scope: Scope::from_raw(scope),
        requester_id: requester.to_string(),
        channel_id: "chan-1".to_string(),
        code: code.to_string(),
    }
}

#[tokio::test]
async fn monitors_survive_restart_and_fire_once_on_transition() {
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("monitors.json");

    // Session 1: register two monitors through the command layer.
    {
        let store = MonitorStore::new();
        let persister = StatePersister::new(state_path.clone());
        let handler = CommandHandler::new(store.clone(), persister.clone());

        let outcome = handler.handle(add_intent("123", "alice", "wanted")).await;
        assert!(matches!(outcome, CommandOutcome::Added(_)));
        let outcome = handler.handle(add_intent("dm", "bob", "patience")).await;
        assert!(matches!(outcome, CommandOutcome::Added(_)));
    }

    // Session 2: reload from disk, then run ticks until "wanted" frees up.
    let store = MonitorStore::new();
    let persister = StatePersister::new(state_path.clone());
    let entries = persister.load().await.unwrap();
    assert_eq!(entries.len(), 2);
    store.replace_all(entries).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let checker = Arc::new(TableChecker {
        table: HashMap::from([
            ("wanted".to_string(), Availability::Available),
            ("patience".to_string(), Availability::Taken),
        ]),
    });
    let scheduler = Scheduler::new(
        store.clone(),
        persister.clone(),
        checker,
        notifier.clone(),
        Duration::from_secs(30),
    );

    scheduler.run_tick().await;

    // "wanted" was notified exactly once and removed; "patience" remains.
    let delivered = notifier.delivered.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].code.as_str(), "wanted");
    assert_eq!(delivered[0].requester_id, "alice");
    assert_eq!(store.len().await, 1);

    // A second tick does not re-notify.
    scheduler.run_tick().await;
    assert_eq!(notifier.delivered.lock().unwrap().len(), 1);

    // Session 3: the removal survives another restart.
    let entries = persister.load().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].code.as_str(), "patience");
    assert_eq!(entries[0].requester_id, "bob");
}

#[tokio::test]
async fn legacy_state_file_is_usable_after_migration() {
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("monitors.json");

    // A pre-versioning state file, keyed by bare vanity code.
    std::fs::write(
        &state_path,
        r#"{
            "oldname": {"requesterId": "alice", "channelId": "c1", "guildId": "123"},
            "dmname": {"requesterId": "bob", "channelId": "c2"}
        }"#,
    )
    .unwrap();

    let store = MonitorStore::new();
    let persister = StatePersister::new(state_path.clone());
    let entries = persister.load().await.unwrap();
    store.replace_all(entries).await;

    assert_eq!(store.len().await, 2);
    let keys: Vec<String> = store
        .snapshot()
        .await
        .iter()
        .map(|(k, _)| k.to_string())
        .collect();
    assert!(keys.contains(&"123_oldname".to_string()));
    assert!(keys.contains(&"dm_dmname".to_string()));

    // The migrated entries behave like native ones: a transition removes
    // and persists as usual.
    let notifier = Arc::new(RecordingNotifier::default());
    let checker = Arc::new(TableChecker {
        table: HashMap::from([("oldname".to_string(), Availability::Available)]),
    });
    let scheduler = Scheduler::new(
        store.clone(),
        persister.clone(),
        checker,
        notifier.clone(),
        Duration::from_secs(30),
    );
    scheduler.run_tick().await;

    assert_eq!(notifier.delivered.lock().unwrap().len(), 1);
    let reloaded = persister.load().await.unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].code.as_str(), "dmname");
    assert_eq!(reloaded[0].scope, Scope::DirectMessage);
}
