use std::path::PathBuf;
use std::time::Duration;

use hadoopit_core::error::{HadoopitError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

fn default_timeout_secs() -> u64 {
    30
}

/// Where and how to reach the namenode's WebHDFS endpoint.
///
/// ```yaml
/// namenode: http://namenode.example.com:9870
/// user: hdfs
/// timeout_secs: 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Base URL of the WebHDFS endpoint (scheme, host and port)
    pub namenode: String,

    /// Sent as `user.name` on every request when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File this configuration was read from, for diagnostics
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl ConnectionConfig {
    pub fn new(namenode: impl Into<String>) -> Self {
        Self {
            namenode: namenode.into(),
            user: None,
            timeout_secs: default_timeout_secs(),
            source_path: None,
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ConnectionConfig = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.namenode_url()?;

        if self.timeout_secs == 0 {
            return Err(HadoopitError::config("timeout_secs must be greater than zero"));
        }
        if let Some(user) = &self.user {
            if user.trim().is_empty() {
                return Err(HadoopitError::config("user must not be empty when set"));
            }
        }
        Ok(())
    }

    /// The namenode as a parsed http(s) URL.
    pub fn namenode_url(&self) -> Result<Url> {
        let raw = self.namenode.trim();
        if raw.is_empty() {
            return Err(HadoopitError::config("namenode must not be empty"));
        }

        let url = Url::parse(raw).map_err(|e| {
            HadoopitError::config_with_source(e, format!("Invalid namenode URL '{}'", raw))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(HadoopitError::config(format!(
                "Unsupported namenode scheme '{}' in '{}', expected http or https",
                other, raw
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ConnectionConfig::from_yaml("namenode: http://nn:9870\n").unwrap();

        assert_eq!(config.namenode, "http://nn:9870");
        assert_eq!(config.user, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_full_config() {
        let yaml = "namenode: https://nn.example.com:9871\nuser: hdfs\ntimeout_secs: 5\n";
        let config = ConnectionConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.user.as_deref(), Some("hdfs"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(
            config.namenode_url().unwrap().host_str(),
            Some("nn.example.com")
        );
    }

    #[test]
    fn test_missing_namenode_is_configuration_error() {
        let err = ConnectionConfig::from_yaml("user: hdfs\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConnectionConfig::from_yaml("namenode: http://nn:9870\nport: 1\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for yaml in [
            "namenode: ''\n",
            "namenode: not a url\n",
            "namenode: hdfs://nn:8020\n",
            "namenode: http://nn:9870\ntimeout_secs: 0\n",
            "namenode: http://nn:9870\nuser: ' '\n",
        ] {
            let result = ConnectionConfig::from_yaml(yaml);
            assert!(result.is_err(), "expected rejection of {:?}", yaml);
        }
    }
}
