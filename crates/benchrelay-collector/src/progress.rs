//! In-memory progress state, keyed by (instance, project).
//!
//! The collector keeps only the latest snapshot per key. State lives in
//! memory and is lost on restart; that is an accepted limitation, since
//! workers re-report within one benchmark completion.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use dashmap::DashMap;

/// Key identifying one run's progress entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    /// Worker instance name.
    pub instance: String,
    /// Benchmark project name.
    pub project: String,
}

impl ProgressKey {
    /// Creates a new progress key.
    #[must_use]
    pub fn new(instance: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            project: project.into(),
        }
    }
}

/// Lifecycle of one run as seen from the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Benchmarks are still executing.
    Running,
    /// All benchmarks finished; the result bundle has not arrived yet.
    Finished,
    /// The result bundle was received and persisted.
    Uploaded,
}

/// Latest known progress for one run.
///
/// Derived purely from the most recent report; earlier snapshots are
/// discarded (last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Benchmarks still to run.
    pub remaining: u32,
    /// Total benchmarks discovered for the run. Fixed once learned.
    pub total: u32,
    /// Estimated finish time, when the worker has one.
    pub estimated_finish: Option<NaiveDateTime>,
    /// When the collector received the report.
    pub reported_at: DateTime<Utc>,
    /// Run lifecycle state.
    pub state: RunState,
}

/// Observer notified after every progress mutation.
///
/// Registration is optional; a listener that misbehaves must swallow its
/// own errors. Notification is fire-and-forget and never affects
/// ingestion.
pub trait ProgressListener: Send + Sync {
    /// Called after a snapshot is stored. `time_remaining` is derived from
    /// the worker's own clock (estimated finish minus its report time) and
    /// is absent when no ETA is known.
    fn on_update(
        &self,
        key: &ProgressKey,
        snapshot: &ProgressSnapshot,
        time_remaining: Option<Duration>,
    );
}

/// Concurrent map from [`ProgressKey`] to the latest [`ProgressSnapshot`].
///
/// Reports for distinct keys never contend; two reports for the same key
/// race with last-write-wins semantics in arrival order.
pub struct ProgressStore {
    entries: DashMap<ProgressKey, ProgressSnapshot>,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("entries", &self.entries.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    /// Creates an empty store with no listener.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            listener: None,
        }
    }

    /// Creates an empty store that notifies the given listener on every
    /// mutation.
    #[must_use]
    pub fn with_listener(listener: Arc<dyn ProgressListener>) -> Self {
        Self {
            entries: DashMap::new(),
            listener: Some(listener),
        }
    }

    /// Upserts the snapshot for `key` from a freshly received report.
    pub fn upsert(
        &self,
        key: ProgressKey,
        remaining: u32,
        total: u32,
        estimated_finish: Option<NaiveDateTime>,
        time_remaining: Option<Duration>,
    ) {
        let snapshot = ProgressSnapshot {
            remaining,
            total,
            estimated_finish,
            reported_at: Utc::now(),
            state: if remaining == 0 {
                RunState::Finished
            } else {
                RunState::Running
            },
        };
        self.entries.insert(key.clone(), snapshot.clone());
        self.notify(&key, &snapshot, time_remaining);
    }

    /// Marks `key`'s run as uploaded, if it has a progress entry.
    pub fn mark_uploaded(&self, key: &ProgressKey) {
        let updated = self.entries.get_mut(key).map(|mut entry| {
            entry.state = RunState::Uploaded;
            entry.clone()
        });
        // Notify outside the map guard so a slow listener never blocks
        // another report for the same key.
        if let Some(snapshot) = updated {
            self.notify(key, &snapshot, None);
        }
    }

    /// Returns a copy of the latest snapshot for `key`.
    #[must_use]
    pub fn get(&self, key: &ProgressKey) -> Option<ProgressSnapshot> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Number of runs with a progress entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no run has reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify(
        &self,
        key: &ProgressKey,
        snapshot: &ProgressSnapshot,
        time_remaining: Option<Duration>,
    ) {
        if let Some(listener) = &self.listener {
            listener.on_update(key, snapshot, time_remaining);
        }
    }
}
