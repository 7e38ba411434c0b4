//! One invocation of the snapshot lifecycle against a directory.

use chrono::{DateTime, SecondsFormat, Utc};
use hadoopit_core::error::Result;
use hadoopit_core::{hit_info, hit_println, hit_success};
use hadoopit_fs::SnapshotFileSystem;
use hadoopit_snapshot::{Clock, Snapshot, SnapshotManager, SnapshotOutcome};
use tracing::debug;

/// What a run did, or for a dry run, what it would have done.
#[derive(Debug)]
pub enum RunReport {
    DryRun {
        due: bool,
        latest: Option<Snapshot>,
        outdated: Vec<Snapshot>,
    },
    Completed {
        outcome: SnapshotOutcome,
        removed: usize,
    },
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Take a snapshot if one is due, then delete outdated ones.
///
/// A failed create aborts the run before cleanup. A dry run only lists and
/// never calls create or delete.
pub fn execute<F, C>(manager: &SnapshotManager<F, C>, dry_run: bool) -> Result<RunReport>
where
    F: SnapshotFileSystem,
    C: Clock,
{
    let directory = &manager.directory().path;
    let policy = manager.policy();
    debug!(
        directory = %directory,
        frequency_minutes = policy.frequency_minutes,
        retention = policy.retention,
        dry_run,
        "Starting snapshot run"
    );

    if dry_run {
        return preview(manager);
    }

    let outcome = manager.take_snapshot()?;
    match &outcome {
        SnapshotOutcome::Created { path, .. } => {
            hit_success!("Snapshot created: {}", path);
        }
        SnapshotOutcome::Skipped { latest, next_due } => {
            hit_info!(
                "Latest snapshot {} is still fresh, next one is due at {}",
                latest,
                timestamp(*next_due)
            );
        }
    }

    let removed = manager.cleanup_outdated_snapshots()?;
    if policy.retention == 0 {
        hit_info!("Retention is 0, keeping every snapshot of {}", directory);
    } else if removed > 0 {
        hit_success!("Removed {} outdated snapshot(s) of {}", removed, directory);
    } else {
        hit_info!("No outdated snapshots of {}", directory);
    }

    Ok(RunReport::Completed { outcome, removed })
}

fn preview<F, C>(manager: &SnapshotManager<F, C>) -> Result<RunReport>
where
    F: SnapshotFileSystem,
    C: Clock,
{
    let directory = &manager.directory().path;
    let latest = manager.latest_snapshot()?;
    let due = manager.need_to_take_snapshot()?;
    let outdated = manager.list_outdated_snapshots()?;

    match (&latest, due) {
        (_, true) => {
            hit_info!("[dry-run] A snapshot of {} is due", directory);
        }
        (Some(latest), false) => {
            hit_info!(
                "[dry-run] Latest snapshot {} is still fresh, next one is due at {}",
                latest,
                timestamp(manager.next_due(latest))
            );
        }
        (None, false) => {}
    }

    if outdated.is_empty() {
        hit_info!("[dry-run] No outdated snapshots of {}", directory);
    } else {
        hit_info!(
            "[dry-run] Would delete {} outdated snapshot(s):",
            outdated.len()
        );
        for snapshot in &outdated {
            hit_println!("  {}", snapshot.path());
        }
    }

    Ok(RunReport::DryRun {
        due,
        latest,
        outdated,
    })
}
