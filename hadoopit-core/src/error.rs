//! Error types for hadoopit.
//!
//! Every failure a run can hit is one of the variants below. Each variant
//! carries the directory, identifier or operation it concerns so an operator
//! can diagnose the failure from the message alone.

use std::fmt;
use thiserror::Error;

/// Boxed error used as the `source` of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single snapshot that could not be deleted during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionFailure {
    /// Identifier of the snapshot that survived the delete attempt
    pub identifier: String,
    /// Message reported by the filesystem
    pub reason: String,
}

impl fmt::Display for DeletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum HadoopitError {
    /// Missing or invalid connection configuration, or an invalid policy.
    #[error("Configuration error: {context}")]
    Configuration {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("The directory '{directory}' is not snapshottable")]
    DirectoryNotSnapshottable { directory: String },

    /// An entry in the managed namespace could not be decoded.
    #[error("Malformed snapshot identifier '{identifier}': {reason}")]
    MalformedIdentifier { identifier: String, reason: String },

    #[error("Failed to create snapshot '{name}' of '{directory}': {source}")]
    SnapshotCreation {
        directory: String,
        name: String,
        #[source]
        source: BoxError,
    },

    /// One or more deletes failed. Cleanup keeps going after a failure, so
    /// `removed` counts the deletes that did succeed in the same batch.
    #[error(
        "Failed to delete {} outdated snapshot(s) of '{directory}' ({removed} removed): {}",
        .failures.len(),
        join_failures(.failures)
    )]
    SnapshotDeletion {
        directory: String,
        removed: usize,
        failures: Vec<DeletionFailure>,
    },

    #[error("Filesystem error during '{operation}' on '{path}': {source}")]
    Filesystem {
        operation: String,
        path: String,
        #[source]
        source: BoxError,
    },
}

fn join_failures(failures: &[DeletionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl HadoopitError {
    /// Create a configuration error without an underlying cause
    pub fn config(context: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
            source: None,
        }
    }

    /// Create a configuration error caused by another error
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        source: E,
        context: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_snapshottable(directory: impl Into<String>) -> Self {
        Self::DirectoryNotSnapshottable {
            directory: directory.into(),
        }
    }

    pub fn malformed(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn snapshot_creation<E: std::error::Error + Send + Sync + 'static>(
        source: E,
        directory: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::SnapshotCreation {
            directory: directory.into(),
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a filesystem error
    pub fn filesystem<E: std::error::Error + Send + Sync + 'static>(
        source: E,
        path: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// True for errors raised before the run touched any snapshot.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::DirectoryNotSnapshottable { .. }
        )
    }
}

impl From<serde_yaml_ng::Error> for HadoopitError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        HadoopitError::config_with_source(err, "Invalid YAML in connection configuration")
    }
}

pub type Result<T> = std::result::Result<T, HadoopitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_config_error_display() {
        let err = HadoopitError::config("The HADOOP_CONF_DIR variable is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: The HADOOP_CONF_DIR variable is required"
        );
        assert!(err.source().is_none());
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_error_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = HadoopitError::config_with_source(io_err, "Failed to read /etc/hadoopit.yaml");

        let source = err.source().expect("source should be preserved");
        assert_eq!(source.to_string(), "no such file");
    }

    #[test]
    fn test_not_snapshottable_names_directory() {
        let err = HadoopitError::not_snapshottable("/data");
        assert_eq!(err.to_string(), "The directory '/data' is not snapshottable");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_identifier_display() {
        let err = HadoopitError::malformed("hadoopit-x-2014", "frequency 'x' is not an integer");
        assert_eq!(
            err.to_string(),
            "Malformed snapshot identifier 'hadoopit-x-2014': frequency 'x' is not an integer"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_snapshot_creation_display() {
        let io_err = io::Error::new(io::ErrorKind::AlreadyExists, "name collision");
        let err = HadoopitError::snapshot_creation(io_err, "/data", "hadoopit-1-2014.1.1.1.1.1.000");

        assert_eq!(
            err.to_string(),
            "Failed to create snapshot 'hadoopit-1-2014.1.1.1.1.1.000' of '/data': name collision"
        );
    }

    #[test]
    fn test_snapshot_deletion_lists_every_failure() {
        let err = HadoopitError::SnapshotDeletion {
            directory: "/data".to_string(),
            removed: 1,
            failures: vec![
                DeletionFailure {
                    identifier: "hadoopit-1-a".to_string(),
                    reason: "permission denied".to_string(),
                },
                DeletionFailure {
                    identifier: "hadoopit-1-b".to_string(),
                    reason: "timeout".to_string(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "Failed to delete 2 outdated snapshot(s) of '/data' (1 removed): \
             hadoopit-1-a (permission denied), hadoopit-1-b (timeout)"
        );
    }

    #[test]
    fn test_filesystem_error_source_chain() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = HadoopitError::filesystem(io_err, "/data/.snapshot", "list");

        assert_eq!(
            err.to_string(),
            "Filesystem error during 'list' on '/data/.snapshot': connection refused"
        );
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn test_yaml_error_becomes_configuration() {
        let yaml_err = serde_yaml_ng::from_str::<u32>("[not, a, number]").unwrap_err();
        let err: HadoopitError = yaml_err.into();
        assert!(err.is_configuration());
    }
}
