//! Connection handles and stale-address cleanup

use crate::clock::Clock;
use crate::daemon::ConnectDetails;
use crate::registry::{DaemonRegistry, RegistryResult};
use crate::stop_events::{StopEvent, STOPPED_BY_USER_OR_OS};
use crate::transport::ConnectFailure;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// How the caller of a failed attempt should treat it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleOutcome {
    /// The address was dead and has been cleaned up; try the next candidate
    Stale,
    /// Cleaned up too, but the caller must not retry: this was the daemon it
    /// just started
    Fatal,
}

/// Which [`StaleOutcome`] a detector reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Attempt against one of several registry candidates
    Expose,
    /// Attempt against a daemon this same request spawned
    Escalate,
}

/// Removes a dead daemon from the registry, bound to one daemon
#[derive(Clone)]
pub struct StaleAddressDetector {
    daemon: ConnectDetails,
    policy: StalePolicy,
    registry: Arc<dyn DaemonRegistry>,
    clock: Arc<dyn Clock>,
}

impl StaleAddressDetector {
    pub fn new(
        daemon: ConnectDetails,
        policy: StalePolicy,
        registry: Arc<dyn DaemonRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            daemon,
            policy,
            registry,
            clock,
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Record a stop event for the daemon and drop its address from the registry
    ///
    /// Every call pairs exactly one stop event with one removal.
    pub async fn maybe_stale_address(&self, failure: &ConnectFailure) -> RegistryResult<StaleOutcome> {
        info!(
            uid = %self.daemon.uid,
            error = %failure,
            "Removing daemon from the registry due to communication failure. Daemon information: {}",
            self.daemon
        );
        let event = StopEvent::new(self.clock.now(), self.daemon.pid, STOPPED_BY_USER_OR_OS);
        self.registry.store_stop_event(event).await?;
        self.registry.remove(&self.daemon.address).await?;

        Ok(match self.policy {
            StalePolicy::Expose => StaleOutcome::Stale,
            StalePolicy::Escalate => StaleOutcome::Fatal,
        })
    }
}

impl fmt::Debug for StaleAddressDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaleAddressDetector")
            .field("daemon", &self.daemon)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A live connection to one daemon, owned by the caller
#[derive(Debug)]
pub struct DaemonConnection<C> {
    connection: C,
    daemon: ConnectDetails,
    stale_detector: StaleAddressDetector,
}

impl<C> DaemonConnection<C> {
    pub fn new(connection: C, daemon: ConnectDetails, stale_detector: StaleAddressDetector) -> Self {
        Self {
            connection,
            daemon,
            stale_detector,
        }
    }

    /// The daemon this connection is attached to
    pub fn daemon(&self) -> &ConnectDetails {
        &self.daemon
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Report that talking to the daemon failed in a way that means it is gone
    pub async fn maybe_stale_address(&self, failure: &ConnectFailure) -> RegistryResult<StaleOutcome> {
        self.stale_detector.maybe_stale_address(failure).await
    }

    pub fn into_inner(self) -> C {
        self.connection
    }
}

/// Result of one connection attempt
#[derive(Debug)]
pub enum ConnectAttempt<C> {
    Connected(DaemonConnection<C>),
    /// The address did not answer and has been cleaned up from the registry
    Unreachable {
        outcome: StaleOutcome,
        failure: ConnectFailure,
    },
}

impl<C> ConnectAttempt<C> {
    pub fn connected(self) -> Option<DaemonConnection<C>> {
        match self {
            Self::Connected(connection) => Some(connection),
            Self::Unreachable { .. } => None,
        }
    }
}
