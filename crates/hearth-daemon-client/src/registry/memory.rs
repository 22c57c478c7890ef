//! Registry held in process memory
//!
//! Useful when the daemons live in the same process as their clients, and
//! as the registry behind tests.

use super::{DaemonRegistry, RegistryResult, RegistryState};
use crate::daemon::{DaemonAddress, DaemonInfo, DaemonState};
use crate::stop_events::StopEvent;
use async_trait::async_trait;
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `daemons`, in order
    pub fn with_daemons(daemons: impl IntoIterator<Item = DaemonInfo>) -> Self {
        let registry = Self::new();
        {
            let mut state = registry.state.write();
            for daemon in daemons {
                state.store(daemon);
            }
        }
        registry
    }
}

#[async_trait]
impl DaemonRegistry for InMemoryRegistry {
    async fn all(&self) -> RegistryResult<Vec<DaemonInfo>> {
        Ok(self.state.read().daemons.clone())
    }

    async fn stop_events(&self) -> RegistryResult<Vec<StopEvent>> {
        Ok(self.state.read().stop_events.clone())
    }

    async fn remove_stop_events(&self, events: &[StopEvent]) -> RegistryResult<()> {
        self.state.write().remove_stop_events(events);
        Ok(())
    }

    async fn store_stop_event(&self, event: StopEvent) -> RegistryResult<()> {
        self.state.write().stop_events.push(event);
        Ok(())
    }

    async fn remove(&self, address: &DaemonAddress) -> RegistryResult<()> {
        self.state.write().remove(address);
        Ok(())
    }

    async fn store(&self, info: DaemonInfo) -> RegistryResult<()> {
        self.state.write().store(info);
        Ok(())
    }

    async fn mark_state(&self, address: &DaemonAddress, state: DaemonState) -> RegistryResult<()> {
        self.state.write().mark_state(address, state);
        Ok(())
    }
}
