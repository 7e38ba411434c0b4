// Standard library imports
use std::fs;
use std::path::{Path, PathBuf};

// External crate imports
use tracing::debug;

// Internal imports
use crate::config::ConnectionConfig;
use hadoopit_core::error::{HadoopitError, Result};

pub const CONFIG_ENV: &str = "HADOOPIT_CONFIG";
pub const HADOOP_CONF_DIR_ENV: &str = "HADOOP_CONF_DIR";
pub const CONFIG_FILE_NAME: &str = "hadoopit.yaml";

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// A loader responsible for finding and loading the connection configuration.
///
/// The loader implements a clear priority chain for discovering the configuration:
/// 1. **Explicit path:** The `--config` argument, when given.
/// 2. **HADOOPIT_CONFIG:** A path to the configuration file.
/// 3. **HADOOP_CONF_DIR:** `hadoopit.yaml` inside the Hadoop configuration directory.
pub struct ConfigLoader {
    env: EnvLookup,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that reads the process environment.
    pub fn new() -> Self {
        Self::with_env(|key| std::env::var(key).ok())
    }

    /// Creates a loader with a custom environment lookup.
    pub fn with_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        Self {
            env: Box::new(lookup),
        }
    }

    /// Loads the `ConnectionConfig` from the first location in the priority chain.
    pub fn load(&self, explicit: Option<&Path>) -> Result<ConnectionConfig> {
        let path = self.resolve(explicit)?;
        debug!("Loading connection config from: {}", path.display());
        self.load_file(&path)
    }

    /// Finds the configuration file without reading it.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        // Priority 1: --config
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        // Priority 2: HADOOPIT_CONFIG
        if let Some(path) = self.non_empty_var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        // Priority 3: $HADOOP_CONF_DIR/hadoopit.yaml
        if let Some(conf_dir) = self.non_empty_var(HADOOP_CONF_DIR_ENV) {
            let trimmed = conf_dir.trim_end_matches('/');
            let conf_dir = if trimmed.is_empty() { "/" } else { trimmed };
            return Ok(Path::new(conf_dir).join(CONFIG_FILE_NAME));
        }

        Err(HadoopitError::config(format!(
            "No connection configuration found. Pass --config, set {} or set {} to a directory containing {}",
            CONFIG_ENV, HADOOP_CONF_DIR_ENV, CONFIG_FILE_NAME
        )))
    }

    fn non_empty_var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.trim().is_empty())
    }

    /// Loads and validates a `ConnectionConfig` from a given file path.
    fn load_file(&self, path: &Path) -> Result<ConnectionConfig> {
        let contents = fs::read_to_string(path).map_err(|e| {
            HadoopitError::config_with_source(
                e,
                format!("Failed to read connection config at {}", path.display()),
            )
        })?;

        let mut config: ConnectionConfig = serde_yaml_ng::from_str(&contents).map_err(|e| {
            HadoopitError::config_with_source(
                e,
                format!("Invalid connection config at {}", path.display()),
            )
        })?;
        config.validate()?;

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }
}
