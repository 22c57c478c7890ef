//! Registry location

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the shared daemon registry lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry file; defaults to `<data dir>/hearth/registry.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl RegistryConfig {
    /// Registry file path with the platform default applied
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_registry_path)
    }
}

/// Default registry location
///
/// Uses the platform data directory if available, otherwise falls back to /tmp.
pub fn default_registry_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("hearth")
        .join("registry.json")
}
