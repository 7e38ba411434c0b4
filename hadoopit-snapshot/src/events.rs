//! Lifecycle notifications.
//!
//! The manager reports what it finds, creates and deletes through a
//! [`LifecycleObserver`] handed to it at construction. The binary uses
//! [`TracingObserver`]; tests use [`RecordingObserver`] to assert on the
//! sequence of events.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use hadoopit_fs::FsError;
use tracing::{debug, info, warn};

use crate::snapshot::Snapshot;

/// Receives lifecycle notifications. Every method defaults to doing nothing.
pub trait LifecycleObserver: Send + Sync {
    /// A managed snapshot was decoded during a listing.
    fn snapshot_found(&self, _snapshot: &Snapshot) {}

    /// No snapshot was taken because the latest one is still fresh.
    fn snapshot_skipped(&self, _directory: &str, _latest: &Snapshot, _next_due: DateTime<Utc>) {}

    fn snapshot_created(&self, _directory: &str, _name: &str, _path: &str) {}

    fn snapshot_deleted(&self, _snapshot: &Snapshot) {}

    /// A delete failed. Cleanup continues with the next snapshot.
    fn deletion_failed(&self, _snapshot: &Snapshot, _error: &FsError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

/// Emits each event as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn snapshot_found(&self, snapshot: &Snapshot) {
        debug!(
            directory = %snapshot.directory().path,
            snapshot = snapshot.identifier(),
            "Found snapshot {}",
            snapshot
        );
    }

    fn snapshot_skipped(&self, directory: &str, latest: &Snapshot, next_due: DateTime<Utc>) {
        info!(
            directory = directory,
            snapshot = latest.identifier(),
            next_due = %next_due.to_rfc3339_opts(SecondsFormat::Millis, true),
            "Latest snapshot is still fresh, nothing to take"
        );
    }

    fn snapshot_created(&self, directory: &str, name: &str, path: &str) {
        info!(
            directory = directory,
            snapshot = name,
            "Snapshot created: {}",
            path
        );
    }

    fn snapshot_deleted(&self, snapshot: &Snapshot) {
        info!(
            directory = %snapshot.directory().path,
            snapshot = snapshot.identifier(),
            "Deleted outdated snapshot {}",
            snapshot
        );
    }

    fn deletion_failed(&self, snapshot: &Snapshot, error: &FsError) {
        warn!(
            directory = %snapshot.directory().path,
            snapshot = snapshot.identifier(),
            "Failed to delete outdated snapshot: {}",
            error
        );
    }
}

/// One recorded notification. Payloads are snapshot identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Found(String),
    Skipped { latest: String, next_due: DateTime<Utc> },
    Created(String),
    Deleted(String),
    DeletionFailed { identifier: String, reason: String },
}

/// Keeps every notification in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LifecycleEvent>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn push(&self, event: LifecycleEvent) {
        self.lock().push(event);
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl LifecycleObserver for RecordingObserver {
    fn snapshot_found(&self, snapshot: &Snapshot) {
        self.push(LifecycleEvent::Found(snapshot.identifier().to_string()));
    }

    fn snapshot_skipped(&self, _directory: &str, latest: &Snapshot, next_due: DateTime<Utc>) {
        self.push(LifecycleEvent::Skipped {
            latest: latest.identifier().to_string(),
            next_due,
        });
    }

    fn snapshot_created(&self, _directory: &str, name: &str, _path: &str) {
        self.push(LifecycleEvent::Created(name.to_string()));
    }

    fn snapshot_deleted(&self, snapshot: &Snapshot) {
        self.push(LifecycleEvent::Deleted(snapshot.identifier().to_string()));
    }

    fn deletion_failed(&self, snapshot: &Snapshot, error: &FsError) {
        self.push(LifecycleEvent::DeletionFailed {
            identifier: snapshot.identifier().to_string(),
            reason: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadoopit_fs::SnapshottableDirectory;
    use std::sync::Arc;

    fn snapshot(name: &str) -> Snapshot {
        Snapshot::from_entry(Arc::new(SnapshottableDirectory::new("/data")), name).unwrap()
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        let old = snapshot("hadoopit-1-2014.01.01.0.0.0.000");
        let new = snapshot("hadoopit-1-2014.01.01.0.5.0.000");

        observer.snapshot_found(&new);
        observer.snapshot_found(&old);
        observer.snapshot_deleted(&old);
        observer.deletion_failed(&new, &FsError::Rejected("busy".to_string()));

        assert_eq!(
            observer.events(),
            vec![
                LifecycleEvent::Found(new.identifier().to_string()),
                LifecycleEvent::Found(old.identifier().to_string()),
                LifecycleEvent::Deleted(old.identifier().to_string()),
                LifecycleEvent::DeletionFailed {
                    identifier: new.identifier().to_string(),
                    reason: "Request rejected: busy".to_string(),
                },
            ]
        );

        observer.clear();
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_observers_accept_every_event() {
        let latest = snapshot("hadoopit-1-2014.01.01.0.0.0.000");
        let observers: Vec<Box<dyn LifecycleObserver>> =
            vec![Box::new(NoopObserver), Box::new(TracingObserver)];

        for observer in observers {
            observer.snapshot_found(&latest);
            observer.snapshot_skipped("/data", &latest, latest.created_at());
            observer.snapshot_created("/data", "n", "/data/.snapshot/n");
            observer.snapshot_deleted(&latest);
            observer.deletion_failed(&latest, &FsError::not_found("/data"));
        }
    }
}
