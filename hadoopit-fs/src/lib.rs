//! Snapshot-capable filesystem abstraction.
//!
//! This library defines the small slice of a distributed filesystem that
//! hadoopit needs: which directories allow snapshots, what lives under a
//! directory's `.snapshot` namespace, and single create/delete calls.
//! [`WebHdfsClient`] talks to HDFS over its REST API.

// Standard library
use std::sync::Arc;

pub mod error;
pub mod path;
pub mod webhdfs;

// When the `test-helpers` feature is enabled, include the in-memory filesystem.
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;

pub use error::{FsError, FsResult};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryFileSystem;
pub use webhdfs::WebHdfsClient;

/// A directory the filesystem allows point-in-time snapshots of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshottableDirectory {
    /// Absolute path of the directory
    pub path: String,
    /// Number of snapshots currently held
    pub snapshot_count: u32,
    /// Maximum number of snapshots the directory allows
    pub snapshot_quota: u32,
    pub owner: String,
    pub group: String,
    pub permission: String,
}

impl SnapshottableDirectory {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path::normalize(&path.into()),
            snapshot_count: 0,
            snapshot_quota: 0,
            owner: String::new(),
            group: String::new(),
            permission: String::new(),
        }
    }

    /// Path of the read-only `.snapshot` namespace under this directory.
    pub fn snapshot_root(&self) -> String {
        path::snapshot_root(&self.path)
    }

    /// Path of a named snapshot of this directory.
    pub fn snapshot_path(&self, name: &str) -> String {
        path::join(&self.snapshot_root(), name)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }
}

/// The filesystem operations the snapshot lifecycle depends on.
///
/// Every call is a single blocking request. Implementations must report a
/// missing path from `list_entries` as [`FsError::NotFound`] so callers can
/// tell an empty namespace apart from a failure.
pub trait SnapshotFileSystem {
    /// Short name of the backend for log output (e.g., "webhdfs").
    fn name(&self) -> &'static str;

    /// List every directory that has been made snapshottable.
    fn list_snapshottable_directories(&self) -> FsResult<Vec<SnapshottableDirectory>>;

    /// List the entries directly under `path`.
    fn list_entries(&self, path: &str) -> FsResult<Vec<DirectoryEntry>>;

    /// Create a snapshot named `name` of `directory` and return its path.
    fn create_snapshot(&self, directory: &str, name: &str) -> FsResult<String>;

    /// Delete the snapshot named `name` of `directory`.
    fn delete_snapshot(&self, directory: &str, name: &str) -> FsResult<()>;
}

macro_rules! forward_snapshot_filesystem {
    ($($wrapper:ty),+ $(,)?) => {
        $(
            impl<T: SnapshotFileSystem + ?Sized> SnapshotFileSystem for $wrapper {
                fn name(&self) -> &'static str {
                    (**self).name()
                }

                fn list_snapshottable_directories(&self) -> FsResult<Vec<SnapshottableDirectory>> {
                    (**self).list_snapshottable_directories()
                }

                fn list_entries(&self, path: &str) -> FsResult<Vec<DirectoryEntry>> {
                    (**self).list_entries(path)
                }

                fn create_snapshot(&self, directory: &str, name: &str) -> FsResult<String> {
                    (**self).create_snapshot(directory, name)
                }

                fn delete_snapshot(&self, directory: &str, name: &str) -> FsResult<()> {
                    (**self).delete_snapshot(directory, name)
                }
            }
        )+
    };
}

forward_snapshot_filesystem!(&T, Box<T>, Arc<T>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshottable_directory_paths() {
        let dir = SnapshottableDirectory::new("/data/warehouse/");

        assert_eq!(dir.path, "/data/warehouse");
        assert_eq!(dir.snapshot_root(), "/data/warehouse/.snapshot");
        assert_eq!(
            dir.snapshot_path("hadoopit-1-2014.01.01.1.1.1.000"),
            "/data/warehouse/.snapshot/hadoopit-1-2014.01.01.1.1.1.000"
        );
    }

    #[test]
    fn test_root_directory_paths() {
        let dir = SnapshottableDirectory::new("/");
        assert_eq!(dir.snapshot_root(), "/.snapshot");
    }

    #[test]
    fn test_trait_objects_forward() {
        let fs = MemoryFileSystem::new();
        fs.allow_snapshot("/a");

        let boxed: Box<dyn SnapshotFileSystem> = Box::new(MemoryFileSystem::new());
        assert_eq!(boxed.name(), "memory");

        let shared = Arc::new(fs);
        let by_ref = &shared;
        assert_eq!(by_ref.list_snapshottable_directories().unwrap().len(), 1);
    }
}
