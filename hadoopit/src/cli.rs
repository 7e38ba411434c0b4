// CLI argument parsing and definitions

use clap::Parser;
use hadoopit_snapshot::codec::validate_label;
use hadoopit_snapshot::SnapshotPolicy;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hadoopit")]
#[command(about = "Take HDFS snapshots on a schedule and expire the old ones")]
#[command(version)]
pub struct Args {
    /// Snapshottable HDFS directory to manage (absolute path)
    #[arg(short = 'd', long = "snapshot-dir", value_name = "DIR")]
    pub snapshot_dir: String,

    /// Minimum number of minutes between two snapshots
    #[arg(
        short = 'f',
        long = "snapshot-freq",
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub snapshot_freq: u32,

    /// Number of most recent snapshots to keep (0 keeps every snapshot)
    #[arg(short = 'r', long = "snapshot-retention", value_name = "COUNT")]
    pub snapshot_retention: u32,

    /// Label appended to new snapshot names
    #[arg(short, long, value_parser = parse_label)]
    pub label: Option<String>,

    /// Report what would be created and deleted without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the connection configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn policy(&self) -> SnapshotPolicy {
        let policy = SnapshotPolicy::new(self.snapshot_freq, self.snapshot_retention);
        match &self.label {
            Some(label) => policy.with_label(label.clone()),
            None => policy,
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "info,hadoopit=debug,hadoopit_snapshot=debug,hadoopit_fs=debug,hadoopit_config=debug"
        } else {
            "warn"
        }
    }
}

fn parse_label(value: &str) -> Result<String, String> {
    validate_label(value)
        .map(|()| value.to_string())
        .map_err(|e| e.to_string())
}
