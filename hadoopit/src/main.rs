// Standard library
use std::process::ExitCode;

// External crates
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

// Internal imports
use hadoopit_config::ConfigLoader;
use hadoopit_core::{hit_error, hit_error_hint, hit_error_with_details, hit_warning, HadoopitError};
use hadoopit_fs::{SnapshotFileSystem, WebHdfsClient};
use hadoopit_snapshot::SnapshotManager;

// Local modules
mod cli;
mod run;

use cli::Args;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    // The guard flushes the file writer on drop, so it lives until exit
    let _log_guard = match hadoopit_logging::init(args.log_filter()) {
        Ok(guard) => guard,
        Err(e) => {
            hit_warning!("Failed to initialize logging: {}", e);
            None
        }
    };

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> anyhow::Result<()> {
    let config = ConfigLoader::new().load(args.config.as_deref())?;
    let client = WebHdfsClient::new(config.namenode_url()?, config.user.clone(), config.timeout())
        .with_context(|| format!("Failed to set up WebHDFS client for {}", config.namenode))?;
    debug!(
        backend = client.name(),
        namenode = %config.namenode,
        config = ?config.source_path,
        "Connecting to filesystem"
    );

    let manager = SnapshotManager::new(client, &args.snapshot_dir, args.policy())?;
    run::execute(&manager, args.dry_run)?;

    info!(directory = %manager.directory().path, "Snapshot run finished");
    Ok(())
}

fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<HadoopitError>() {
        Some(HadoopitError::SnapshotDeletion {
            directory,
            removed,
            failures,
        }) => {
            hit_error_with_details!(
                format!(
                    "Failed to delete {} outdated snapshot(s) of {} ({} removed)",
                    failures.len(),
                    directory,
                    removed
                ),
                failures
            );
        }
        Some(HadoopitError::DirectoryNotSnapshottable { directory }) => {
            hit_error!("{}", error_message(error));
            hit_error_hint!("Allow snapshots first: hdfs dfsadmin -allowSnapshot {}", directory);
        }
        _ => {
            hit_error!("{}", error_message(error));
        }
    }
}

/// The error and its causes on one line. A cause whose text the message
/// already contains is not repeated.
fn error_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}
