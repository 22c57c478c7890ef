//! Registry persisted as a JSON document
//!
//! Every call reads the whole file; mutations rewrite it through a temp
//! file and a rename so readers never see a half-written document. There is
//! no locking: two clients mutating at once can lose one update, which the
//! connector tolerates like any other stale read.

use super::{DaemonRegistry, RegistryError, RegistryResult, RegistryState};
use crate::daemon::{DaemonAddress, DaemonInfo, DaemonState};
use crate::stop_events::StopEvent;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read(&self) -> RegistryResult<RegistryState> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RegistryState::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(RegistryState::default());
        }
        serde_json::from_str(&contents).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, state: &RegistryState) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(state).map_err(|source| RegistryError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension(format!("tmp.{}", std::process::id()));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn update(&self, change: impl FnOnce(&mut RegistryState) + Send) -> RegistryResult<()> {
        let mut state = self.read().await?;
        change(&mut state);
        debug!(path = %self.path.display(), "Rewriting daemon registry");
        self.write(&state).await
    }
}

#[async_trait]
impl DaemonRegistry for FileRegistry {
    async fn all(&self) -> RegistryResult<Vec<DaemonInfo>> {
        Ok(self.read().await?.daemons)
    }

    async fn stop_events(&self) -> RegistryResult<Vec<StopEvent>> {
        Ok(self.read().await?.stop_events)
    }

    async fn remove_stop_events(&self, events: &[StopEvent]) -> RegistryResult<()> {
        self.update(|state| state.remove_stop_events(events)).await
    }

    async fn store_stop_event(&self, event: StopEvent) -> RegistryResult<()> {
        self.update(|state| state.stop_events.push(event)).await
    }

    async fn remove(&self, address: &DaemonAddress) -> RegistryResult<()> {
        self.update(|state| state.remove(address)).await
    }

    async fn store(&self, info: DaemonInfo) -> RegistryResult<()> {
        self.update(|state| state.store(info)).await
    }

    async fn mark_state(&self, address: &DaemonAddress, state: DaemonState) -> RegistryResult<()> {
        self.update(|registry| registry.mark_state(address, state)).await
    }
}
