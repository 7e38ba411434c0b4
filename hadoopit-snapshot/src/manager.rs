//! Snapshot lifecycle for one directory under one policy.
//!
//! A [`SnapshotManager`] answers three questions from live filesystem state:
//! which managed snapshots exist, whether a new one is due, and which fall
//! outside the retention window. It keeps no cache between calls.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use hadoopit_core::error::{DeletionFailure, HadoopitError, Result};
use hadoopit_fs::{path, SnapshotFileSystem, SnapshottableDirectory};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::events::{LifecycleObserver, TracingObserver};
use crate::snapshot::{self, Snapshot};

/// Frequency, retention and label bound to a manager for its whole life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Minimum interval between snapshots, in minutes
    pub frequency_minutes: u32,
    /// Number of most recent snapshots to keep; 0 disables cleanup
    pub retention: u32,
    pub label: Option<String>,
}

impl SnapshotPolicy {
    pub fn new(frequency_minutes: u32, retention: u32) -> Self {
        Self {
            frequency_minutes,
            retention,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn frequency(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.frequency_minutes))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frequency_minutes == 0 {
            return Err(HadoopitError::config(
                "Snapshot frequency must be at least 1 minute",
            ));
        }
        if let Some(label) = &self.label {
            codec::validate_label(label)?;
        }
        Ok(())
    }
}

/// Result of [`SnapshotManager::take_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Created {
        name: String,
        path: String,
    },
    /// The latest snapshot is younger than the frequency interval.
    Skipped {
        latest: Snapshot,
        next_due: DateTime<Utc>,
    },
}

impl SnapshotOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    pub fn created_path(&self) -> Option<&str> {
        match self {
            Self::Created { path, .. } => Some(path),
            Self::Skipped { .. } => None,
        }
    }
}

pub struct SnapshotManager<F, C = SystemClock> {
    fs: F,
    clock: C,
    observer: Arc<dyn LifecycleObserver>,
    policy: SnapshotPolicy,
    directory: Arc<SnapshottableDirectory>,
}

impl<F: SnapshotFileSystem> SnapshotManager<F> {
    /// Bind a policy to a snapshottable directory.
    ///
    /// Fails with a configuration error for an invalid policy or a relative
    /// path, and with `DirectoryNotSnapshottable` when the filesystem does not
    /// list the directory as snapshottable.
    pub fn new(fs: F, directory: &str, policy: SnapshotPolicy) -> Result<Self> {
        policy.validate()?;
        if !path::is_absolute(directory) {
            return Err(HadoopitError::config(format!(
                "Snapshot directory '{}' must be an absolute path",
                directory
            )));
        }

        let wanted = path::normalize(directory);
        let directory = fs
            .list_snapshottable_directories()
            .map_err(|e| HadoopitError::filesystem(e, &wanted, "list snapshottable directories"))?
            .into_iter()
            .find(|d| d.path == wanted)
            .ok_or_else(|| HadoopitError::not_snapshottable(&wanted))?;

        debug!(
            directory = %directory.path,
            backend = fs.name(),
            snapshot_count = directory.snapshot_count,
            "Resolved snapshottable directory"
        );

        Ok(Self {
            fs,
            clock: SystemClock,
            observer: Arc::new(TracingObserver),
            policy,
            directory: Arc::new(directory),
        })
    }
}

impl<F, C> SnapshotManager<F, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SnapshotManager<F, C2> {
        SnapshotManager {
            fs: self.fs,
            clock,
            observer: self.observer,
            policy: self.policy,
            directory: self.directory,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn directory(&self) -> &SnapshottableDirectory {
        &self.directory
    }

    pub fn policy(&self) -> &SnapshotPolicy {
        &self.policy
    }

    /// When a new snapshot becomes due after `latest`.
    pub fn next_due(&self, latest: &Snapshot) -> DateTime<Utc> {
        latest
            .created_at()
            .checked_add_signed(self.policy.frequency())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl<F: SnapshotFileSystem, C: Clock> SnapshotManager<F, C> {
    /// Every snapshot carrying this policy's frequency tag, newest first.
    ///
    /// Entries of other frequencies and plain files are ignored. An entry
    /// that carries the tag but does not decode fails the whole listing.
    pub fn list_all_snapshots(&self) -> Result<Vec<Snapshot>> {
        let root = self.directory.snapshot_root();
        let entries = match self.fs.list_entries(&root) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(HadoopitError::filesystem(e, root, "list")),
        };

        let prefix = codec::name_prefix(self.policy.frequency_minutes);
        let mut snapshots = entries
            .into_iter()
            .filter(|entry| entry.is_directory && entry.name.starts_with(&prefix))
            .map(|entry| Snapshot::from_entry(Arc::clone(&self.directory), &entry.name))
            .collect::<Result<Vec<_>>>()?;

        snapshot::sort_chronologically(&mut snapshots);
        snapshots.reverse();

        for snapshot in &snapshots {
            self.observer.snapshot_found(snapshot);
        }
        Ok(snapshots)
    }

    pub fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        Ok(self.list_all_snapshots()?.into_iter().next())
    }

    /// True when there is no snapshot yet or the latest one is at least one
    /// frequency interval old.
    pub fn need_to_take_snapshot(&self) -> Result<bool> {
        Ok(match self.latest_snapshot()? {
            None => true,
            Some(latest) => self.clock.now() >= self.next_due(&latest),
        })
    }

    /// Snapshots beyond the newest `retention`, newest first.
    pub fn list_outdated_snapshots(&self) -> Result<Vec<Snapshot>> {
        if self.policy.retention == 0 {
            return Ok(Vec::new());
        }
        let retention = self.policy.retention as usize;
        Ok(self
            .list_all_snapshots()?
            .into_iter()
            .skip(retention)
            .collect())
    }

    /// Create a snapshot if one is due.
    pub fn take_snapshot(&self) -> Result<SnapshotOutcome> {
        let now = self.clock.now();

        if let Some(latest) = self.latest_snapshot()? {
            let next_due = self.next_due(&latest);
            if now < next_due {
                self.observer
                    .snapshot_skipped(&self.directory.path, &latest, next_due);
                return Ok(SnapshotOutcome::Skipped { latest, next_due });
            }
        }

        let name = codec::encode(
            self.policy.frequency_minutes,
            codec::truncate_to_millis(now),
            self.policy.label.as_deref(),
        )?;
        let path = self
            .fs
            .create_snapshot(&self.directory.path, &name)
            .map_err(|e| HadoopitError::snapshot_creation(e, &self.directory.path, &name))?;

        self.observer
            .snapshot_created(&self.directory.path, &name, &path);
        Ok(SnapshotOutcome::Created { name, path })
    }

    /// Delete every outdated snapshot and return how many were removed.
    ///
    /// Each outdated snapshot gets one delete attempt even after an earlier
    /// one failed. Any failure turns the result into `SnapshotDeletion`,
    /// which still reports the number removed.
    pub fn cleanup_outdated_snapshots(&self) -> Result<usize> {
        if self.policy.retention == 0 {
            return Ok(0);
        }

        let mut removed = 0;
        let mut failures = Vec::new();
        for snapshot in self.list_outdated_snapshots()? {
            match self
                .fs
                .delete_snapshot(&self.directory.path, snapshot.identifier())
            {
                Ok(()) => {
                    removed += 1;
                    self.observer.snapshot_deleted(&snapshot);
                }
                Err(e) => {
                    self.observer.deletion_failed(&snapshot, &e);
                    failures.push(DeletionFailure {
                        identifier: snapshot.identifier().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(HadoopitError::SnapshotDeletion {
                directory: self.directory.path.clone(),
                removed,
                failures,
            })
        }
    }
}
