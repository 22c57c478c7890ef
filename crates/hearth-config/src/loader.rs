//! Loading [`HearthConfig`] from disk and the environment

use crate::{ConnectorConfig, DaemonConfig, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Overrides the connect timeout, in milliseconds
pub const ENV_CONNECT_TIMEOUT_MS: &str = "HEARTH_CONNECT_TIMEOUT_MS";

/// Overrides the registry file path
pub const ENV_REGISTRY: &str = "HEARTH_REGISTRY";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`HearthConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// An environment override holds a value of the wrong shape
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

/// Specialized Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearthConfig {
    /// Connector timing
    #[serde(default)]
    pub connector: ConnectorConfig,
    /// Registry location
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Daemon launch settings
    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl HearthConfig {
    /// Load configuration with precedence: defaults < file < env
    ///
    /// `config_file` defaults to [`HearthConfig::default_config_path`]. A
    /// missing file is not an error.
    pub fn load(config_file: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_file.or_else(Self::default_config_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            self.connector.connect_timeout_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_CONNECT_TIMEOUT_MS,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_REGISTRY) {
            self.registry.path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Get default config file path (`<config dir>/hearth/config.toml`)
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hearth").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = HearthConfig::load(Some(tmp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.connector, ConnectorConfig::default());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[connector]
connect_timeout_ms = 5000

[registry]
path = "/tmp/hearth-test/registry.json"

[daemon]
program = "/opt/hearth/bin/hearth-daemon"
options = ["-Xmx2g"]
"#,
        )
        .unwrap();

        let config = HearthConfig::from_file(&path).unwrap();
        assert_eq!(config.connector.connect_timeout_ms, 5000);
        assert_eq!(config.connector.poll_interval_ms, 200);
        assert_eq!(
            config.registry.resolved_path(),
            PathBuf::from("/tmp/hearth-test/registry.json")
        );
        assert_eq!(config.daemon.options, vec!["-Xmx2g".to_string()]);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[connector\nconnect_timeout_ms = ").unwrap();

        let err = HearthConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_CONNECT_TIMEOUT_MS, "1500"),
            (ENV_REGISTRY, "/srv/registry.json"),
        ]
        .into_iter()
        .collect();

        let mut config = HearthConfig::default();
        config
            .apply_env(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.connector.connect_timeout_ms, 1500);
        assert_eq!(config.registry.path, Some(PathBuf::from("/srv/registry.json")));
    }

    #[test]
    fn test_invalid_env_timeout_is_rejected() {
        let mut config = HearthConfig::default();
        let err = config
            .apply_env(|var| (var == ENV_CONNECT_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_CONNECT_TIMEOUT_MS, .. }));
    }
}
