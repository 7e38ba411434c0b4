//! In-memory snapshot filesystem for tests.
//!
//! Behaves like HDFS for the operations hadoopit uses: listings of a missing
//! path fail with `NotFound`, creating a snapshot whose name already exists is
//! rejected, and only snapshottable directories accept snapshots. Failures can
//! be injected per operation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{FsError, FsResult};
use crate::path;
use crate::{DirectoryEntry, SnapshotFileSystem, SnapshottableDirectory};

#[derive(Debug, Default)]
struct DirectoryState {
    snapshottable: bool,
    /// Entries under `.snapshot`, keyed by name, valued by `is_directory`
    snapshots: BTreeMap<String, bool>,
}

#[derive(Debug, Default)]
struct State {
    directories: BTreeMap<String, DirectoryState>,
    create_failure: Option<String>,
    failing_deletes: BTreeSet<String>,
    create_calls: usize,
    delete_calls: usize,
}

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a plain directory.
    pub fn mkdir(&self, dir: &str) {
        self.state()
            .directories
            .entry(path::normalize(dir))
            .or_default();
    }

    /// Create the directory if needed and allow snapshots of it.
    pub fn allow_snapshot(&self, dir: &str) {
        self.state()
            .directories
            .entry(path::normalize(dir))
            .or_default()
            .snapshottable = true;
    }

    pub fn remove_directory(&self, dir: &str) {
        self.state().directories.remove(&path::normalize(dir));
    }

    /// Place a raw entry in a directory's `.snapshot` namespace, bypassing
    /// every check. Used to simulate foreign or corrupt entries.
    pub fn insert_entry(&self, dir: &str, name: &str, is_directory: bool) {
        self.state()
            .directories
            .entry(path::normalize(dir))
            .or_default()
            .snapshots
            .insert(name.to_string(), is_directory);
    }

    /// Make every following create fail with `message`.
    pub fn fail_creates(&self, message: &str) {
        self.state().create_failure = Some(message.to_string());
    }

    /// Make deletes of the snapshot named `name` fail.
    pub fn fail_delete_of(&self, name: &str) {
        self.state().failing_deletes.insert(name.to_string());
    }

    /// Names in a directory's `.snapshot` namespace, sorted.
    pub fn snapshot_names(&self, dir: &str) -> Vec<String> {
        self.state()
            .directories
            .get(&path::normalize(dir))
            .map(|d| d.snapshots.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state().delete_calls
    }
}

fn not_snapshottable(dir: &str) -> FsError {
    FsError::remote(
        "SnapshotException",
        format!("Directory is not a snapshottable directory: {}", dir),
    )
}

impl SnapshotFileSystem for MemoryFileSystem {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list_snapshottable_directories(&self) -> FsResult<Vec<SnapshottableDirectory>> {
        Ok(self
            .state()
            .directories
            .iter()
            .filter(|(_, d)| d.snapshottable)
            .map(|(p, d)| SnapshottableDirectory {
                snapshot_count: d.snapshots.len() as u32,
                snapshot_quota: 65536,
                ..SnapshottableDirectory::new(p.clone())
            })
            .collect())
    }

    fn list_entries(&self, fs_path: &str) -> FsResult<Vec<DirectoryEntry>> {
        let normalized = path::normalize(fs_path);
        let state = self.state();

        let snapshot_suffix = format!("/{}", path::SNAPSHOT_DIR);
        let (dir, in_snapshot_namespace) = match normalized.strip_suffix(snapshot_suffix.as_str()) {
            Some("") => ("/".to_string(), true),
            Some(parent) => (parent.to_string(), true),
            None => (normalized.clone(), false),
        };
        let directory = state
            .directories
            .get(&dir)
            .ok_or_else(|| FsError::not_found(&normalized))?;

        if !in_snapshot_namespace {
            return Ok(Vec::new());
        }
        if !directory.snapshottable && directory.snapshots.is_empty() {
            return Err(FsError::not_found(&normalized));
        }

        Ok(directory
            .snapshots
            .iter()
            .map(|(name, is_directory)| DirectoryEntry {
                name: name.clone(),
                is_directory: *is_directory,
            })
            .collect())
    }

    fn create_snapshot(&self, directory: &str, name: &str) -> FsResult<String> {
        let dir = path::normalize(directory);
        let mut state = self.state();
        state.create_calls += 1;

        if let Some(message) = &state.create_failure {
            return Err(FsError::Rejected(message.clone()));
        }

        let entry = state
            .directories
            .get_mut(&dir)
            .ok_or_else(|| FsError::not_found(&dir))?;
        if !entry.snapshottable {
            return Err(not_snapshottable(&dir));
        }
        if entry.snapshots.contains_key(name) {
            return Err(FsError::remote(
                "SnapshotException",
                format!(
                    "Failed to add snapshot: there is already a snapshot with the same name \"{}\".",
                    name
                ),
            ));
        }

        entry.snapshots.insert(name.to_string(), true);
        Ok(path::join(&path::snapshot_root(&dir), name))
    }

    fn delete_snapshot(&self, directory: &str, name: &str) -> FsResult<()> {
        let dir = path::normalize(directory);
        let mut state = self.state();
        state.delete_calls += 1;

        if state.failing_deletes.contains(name) {
            return Err(FsError::Rejected(format!("delete of {} refused", name)));
        }

        let entry = state
            .directories
            .get_mut(&dir)
            .ok_or_else(|| FsError::not_found(&dir))?;
        if entry.snapshots.remove(name).is_none() {
            return Err(FsError::remote(
                "SnapshotException",
                format!("Cannot delete snapshot {} from path {}: the snapshot does not exist.", name, dir),
            ));
        }
        Ok(())
    }
}
