//! Periodic availability checking.
//!
//! The scheduler is stateless between ticks: everything it needs lives in
//! the store. Each tick takes a snapshot, checks every entry sequentially,
//! and on a taken-to-available transition notifies, removes the entry, and
//! persists. Ticks are serialized (a slow tick delays the next one rather
//! than overlapping it) and nothing in the loop can terminate the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::checker::{Availability, VanityChecker};
use crate::notifier::Notifier;
use crate::persistence::StatePersister;
use crate::store::MonitorStore;

/// Drives availability checks on a fixed interval.
pub struct Scheduler {
    store: MonitorStore,
    persister: StatePersister,
    checker: Arc<dyn VanityChecker>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler over the shared store.
    #[must_use]
    pub fn new(
        store: MonitorStore,
        persister: StatePersister,
        checker: Arc<dyn VanityChecker>,
        notifier: Arc<dyn Notifier>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            persister,
            checker,
            notifier,
            tick_interval,
        }
    }

    /// Runs ticks until the task is dropped.
    ///
    /// Uses [`MissedTickBehavior::Delay`]: when a tick runs longer than the
    /// interval, the next tick starts late instead of overlapping.
    pub async fn run(&self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.tick_interval.as_secs(),
            "Availability scheduler started"
        );

        loop {
            ticker.tick().await;
            self.run_tick().await;
        }
    }

    /// Executes one check-all-entries pass.
    ///
    /// Entries are checked sequentially from a point-in-time snapshot, so
    /// the store lock is never held across a network call. A failed check
    /// or notification affects only its own entry.
    pub async fn run_tick(&self) {
        let snapshot = self.store.snapshot().await;
        if snapshot.is_empty() {
            return;
        }

        debug!(entries = snapshot.len(), "Checking monitored vanity URLs");

        for (key, entry) in snapshot {
            match self.checker.check(&entry.code).await {
                Availability::Taken | Availability::Unknown => {
                    // Still taken (or could not tell). Try again next tick.
                }
                Availability::Available => {
                    info!(
                        key = %key,
                        requester = %entry.requester_id,
                        "Vanity URL became available"
                    );

                    // At-most-once delivery: the entry is removed whether or
                    // not the notification lands. A failed notice is a
                    // silent miss.
                    if let Err(err) = self.notifier.notify(&entry).await {
                        error!(key = %key, error = %err, "Failed to deliver availability notice");
                    }

                    if self.store.remove(&key).await.is_none() {
                        // A command removed it mid-tick; that removal
                        // already persisted the store.
                        debug!(key = %key, "Entry removed while tick was in flight");
                        continue;
                    }

                    if let Err(err) = self.persister.save(&self.store).await {
                        warn!(key = %key, error = %err, "Failed to persist store after removal");
                    }
                }
            }
        }
    }
}
