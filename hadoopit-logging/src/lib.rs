//! Tracing initialization for hadoopit
//!
//! hadoopit is usually run from a scheduler, so logs go to stderr by default
//! and can be redirected to a file with `HADOOPIT_LOG_FILE`.
//!
//! Uses standard RUST_LOG environment variable for filtering:
//! - `RUST_LOG=debug` - Set global level
//! - `RUST_LOG=hadoopit_snapshot=debug` - Set per-crate levels
//!
//! Uses RUST_LOG_FORMAT for output format (optional):
//! - `pretty` - Pretty formatted output (default)
//! - `compact` - Compact single-line output
//! - `json` - JSON formatted output

use std::path::{Path, PathBuf};

use hadoopit_core::error::{HadoopitError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "HADOOPIT_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to `Pretty`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter used when RUST_LOG is not set
    pub default_filter: String,
    pub format: LogFormat,
    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env(default_filter: &str) -> Self {
        Self::from_lookup(default_filter, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(default_filter: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup(LOG_FORMAT_ENV)
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();
        let file = lookup(LOG_FILE_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self {
            default_filter: default_filter.to_string(),
            format,
            file,
        }
    }
}

/// Initialize the global subscriber from the environment.
///
/// The returned guard flushes the log file on drop and must be held for the
/// lifetime of the process when file output is enabled.
pub fn init(default_filter: &str) -> Result<Option<WorkerGuard>> {
    init_with(&LogSettings::from_env(default_filter))
}

pub fn init_with(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_filter));

    let (writer, guard) = match &settings.file {
        Some(path) => {
            let (directory, file_name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(settings.file.is_none());

    let registry = tracing_subscriber::registry().with(env_filter);
    let initialized = match settings.format {
        LogFormat::Json => registry.with(fmt_layer.json()).try_init(),
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt_layer.pretty()).try_init(),
    };
    initialized.map_err(|e| HadoopitError::config_with_source(e, "Failed to initialize tracing"))?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path.file_name().ok_or_else(|| {
        HadoopitError::config(format!(
            "{} must name a file, got '{}'",
            LOG_FILE_ENV,
            path.display()
        ))
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Compact "), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Pretty);
    }

    #[test]
    fn test_settings_defaults_without_env() {
        let settings = LogSettings::from_lookup("info", lookup_from(&[]));
        assert_eq!(settings.default_filter, "info");
        assert_eq!(settings.format, LogFormat::Pretty);
        assert_eq!(settings.file, None);
    }

    #[test]
    fn test_settings_read_format_and_file() {
        let settings = LogSettings::from_lookup(
            "debug",
            lookup_from(&[
                (LOG_FORMAT_ENV, "json"),
                (LOG_FILE_ENV, "/var/log/hadoopit.log"),
            ]),
        );
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.file, Some(PathBuf::from("/var/log/hadoopit.log")));
    }

    #[test]
    fn test_blank_log_file_is_ignored() {
        let settings = LogSettings::from_lookup("info", lookup_from(&[(LOG_FILE_ENV, "  ")]));
        assert_eq!(settings.file, None);
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/hadoopit.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "hadoopit.log");

        let (dir, name) = split_log_path(Path::new("hadoopit.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "hadoopit.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }

    // The global subscriber can only be installed once per process, so file
    // output and double initialization are covered by a single test.
    #[test]
    fn test_init_with_file_writes_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file = temp_dir.path().join("hadoopit.log");
        let settings = LogSettings {
            default_filter: "info".to_string(),
            format: LogFormat::Compact,
            file: Some(log_file.clone()),
        };

        let guard = init_with(&settings).expect("first init succeeds");
        assert!(guard.is_some());

        tracing::info!(directory = "/data", "snapshot check finished");
        drop(guard);

        let contents = std::fs::read_to_string(&log_file).unwrap();
        assert!(contents.contains("snapshot check finished"));

        assert!(init_with(&settings).is_err());
    }
}
