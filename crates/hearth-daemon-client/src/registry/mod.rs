//! Shared registry of known daemons and recent stop events
//!
//! The registry is shared mutable state across processes. Implementations
//! here apply each call on its own; nothing ties two calls together, so
//! every read is a snapshot that may already be stale.

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::InMemoryRegistry;

use crate::daemon::{DaemonAddress, DaemonInfo, DaemonState};
use crate::stop_events::StopEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Registry operation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to access registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Registry {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Specialized Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Directory of daemons the connector discovers candidates from
#[async_trait]
pub trait DaemonRegistry: Send + Sync {
    /// Every known daemon, in registry order
    async fn all(&self) -> RegistryResult<Vec<DaemonInfo>>;

    /// Daemons not currently idle, in registry order
    ///
    /// A newly started daemon registers itself busy, so this is where the
    /// connector looks for the daemon it just spawned.
    async fn not_idle(&self) -> RegistryResult<Vec<DaemonInfo>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|daemon| !daemon.is_idle())
            .collect())
    }

    async fn stop_events(&self) -> RegistryResult<Vec<StopEvent>>;

    async fn remove_stop_events(&self, events: &[StopEvent]) -> RegistryResult<()>;

    async fn store_stop_event(&self, event: StopEvent) -> RegistryResult<()>;

    /// Forget the daemon advertising `address`
    async fn remove(&self, address: &DaemonAddress) -> RegistryResult<()>;

    /// Add or replace the entry for `info.address`
    async fn store(&self, info: DaemonInfo) -> RegistryResult<()>;

    async fn mark_state(&self, address: &DaemonAddress, state: DaemonState) -> RegistryResult<()>;

    async fn mark_busy(&self, address: &DaemonAddress) -> RegistryResult<()> {
        self.mark_state(address, DaemonState::Busy).await
    }

    async fn mark_idle(&self, address: &DaemonAddress) -> RegistryResult<()> {
        self.mark_state(address, DaemonState::Idle).await
    }
}

/// Registry contents, shared by the in-memory and file-backed registries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RegistryState {
    #[serde(default)]
    pub daemons: Vec<DaemonInfo>,
    #[serde(default)]
    pub stop_events: Vec<StopEvent>,
}

impl RegistryState {
    pub fn store(&mut self, info: DaemonInfo) {
        match self.daemons.iter_mut().find(|d| d.address == info.address) {
            Some(existing) => *existing = info,
            None => self.daemons.push(info),
        }
    }

    pub fn remove(&mut self, address: &DaemonAddress) {
        self.daemons.retain(|d| &d.address != address);
    }

    pub fn mark_state(&mut self, address: &DaemonAddress, state: DaemonState) {
        for daemon in self.daemons.iter_mut().filter(|d| &d.address == address) {
            daemon.state = state;
        }
    }

    pub fn remove_stop_events(&mut self, events: &[StopEvent]) {
        self.stop_events.retain(|event| !events.contains(event));
    }
}
