//! Snapshot lifecycle management
//!
//! Decides when a directory is due for a new snapshot and which existing
//! snapshots fall outside the retention window. All scheduling state lives in
//! the snapshot names themselves, so every run starts from filesystem truth.

pub mod clock;
pub mod codec;
pub mod events;
pub mod manager;
pub mod snapshot;

// Re-export key types
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::DecodedName;
pub use events::{
    LifecycleEvent, LifecycleObserver, NoopObserver, RecordingObserver, TracingObserver,
};
pub use manager::{SnapshotManager, SnapshotOutcome, SnapshotPolicy};
pub use snapshot::Snapshot;
