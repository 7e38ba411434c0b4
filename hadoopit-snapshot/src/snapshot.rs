//! The decoded view of one managed snapshot.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use hadoopit_core::error::Result;
use hadoopit_fs::SnapshottableDirectory;

use crate::codec;

/// A snapshot entry as seen by one directory listing.
///
/// Values are read-only projections: a later listing produces new values even
/// for the same underlying snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    identifier: String,
    created_at: DateTime<Utc>,
    frequency_minutes: u32,
    label: Option<String>,
    directory: Arc<SnapshottableDirectory>,
}

impl Snapshot {
    /// Decode a `.snapshot` entry of `directory`.
    pub fn from_entry(directory: Arc<SnapshottableDirectory>, identifier: &str) -> Result<Self> {
        let decoded = codec::decode(identifier)?;
        Ok(Self {
            identifier: identifier.to_string(),
            created_at: decoded.created_at,
            frequency_minutes: decoded.frequency_minutes,
            label: decoded.label,
            directory,
        })
    }

    /// The snapshot name as stored by the filesystem.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn frequency_minutes(&self) -> u32 {
        self.frequency_minutes
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn directory(&self) -> &SnapshottableDirectory {
        &self.directory
    }

    /// Full path of the snapshot, `<directory>/.snapshot/<identifier>`.
    pub fn path(&self) -> String {
        self.directory.snapshot_path(&self.identifier)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]",
            self.directory.path,
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Order two snapshots by creation time, oldest first.
pub fn chronological(a: &Snapshot, b: &Snapshot) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

/// Stable sort, oldest first. Snapshots with equal timestamps keep their
/// relative order.
pub fn sort_chronologically(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(chronological);
}
