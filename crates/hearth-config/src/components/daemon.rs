//! How new daemons are launched and what they must be compatible with

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default idle timeout handed to spawned daemons (three hours)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 3 * 60 * 60 * 1000;

/// Daemon launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Daemon executable
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Extra arguments passed before the connector's own flags
    #[serde(default)]
    pub args: Vec<String>,
    /// Runtime home the daemon must run under; defaults to the program's directory
    #[serde(default)]
    pub runtime: Option<PathBuf>,
    /// Options a daemon must have been started with to be reused
    #[serde(default)]
    pub options: Vec<String>,
    /// Idle timeout handed to new daemons
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: u64,
    /// Directory for daemon log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_program() -> PathBuf { PathBuf::from("hearth-daemon") }
fn default_idle_timeout() -> u64 { DEFAULT_IDLE_TIMEOUT_MS }

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            runtime: None,
            options: Vec::new(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            log_dir: None,
        }
    }
}

impl DaemonConfig {
    /// Runtime home requested from daemons
    ///
    /// Falls back to the directory holding the daemon program, or the
    /// program path itself when it has no parent.
    pub fn resolved_runtime(&self) -> PathBuf {
        if let Some(runtime) = &self.runtime {
            return runtime.clone();
        }
        match self.program.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.program.clone(),
        }
    }

    /// Directory daemon logs are written to
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("hearth")
                .join("logs")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defaults_to_program_directory() {
        let config = DaemonConfig {
            program: PathBuf::from("/opt/hearth/bin/hearth-daemon"),
            ..Default::default()
        };
        assert_eq!(config.resolved_runtime(), PathBuf::from("/opt/hearth/bin"));
    }

    #[test]
    fn test_bare_program_is_its_own_runtime() {
        let config = DaemonConfig::default();
        assert_eq!(config.resolved_runtime(), PathBuf::from("hearth-daemon"));
    }

    #[test]
    fn test_explicit_runtime_wins() {
        let config = DaemonConfig {
            runtime: Some(PathBuf::from("/usr/lib/jvm/17")),
            ..Default::default()
        };
        assert_eq!(config.resolved_runtime(), PathBuf::from("/usr/lib/jvm/17"));
    }
}
