//! Terminal failures of the daemon connector

use crate::registry::RegistryError;
use crate::starter::SpawnError;
use crate::transport::ConnectFailure;
use thiserror::Error;

/// Failures surfaced by [`DaemonConnector`](crate::DaemonConnector)
///
/// "This candidate did not answer" is never an error; it is handled inside
/// the connector. Every variant here ends the request.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A freshly started daemon registered with a context the request does not accept
    #[error(
        "The newly created daemon process has a different context than expected.\n\
         It won't be possible to reconnect to this daemon. Context mismatch:\n{explanation}"
    )]
    ContextMismatch {
        /// Why the constraint rejected the daemon
        explanation: String,
    },

    /// No matching daemon became connectable before the deadline
    #[error("Timeout waiting to connect to the build daemon.\n{description}")]
    StartupTimeout {
        /// Spawner diagnostics for the daemon that never showed up
        description: String,
    },

    /// A daemon that had to be reachable refused the connection
    #[error("Could not connect to the build daemon.\n{description}")]
    Connect {
        /// Which daemon was being connected to
        description: String,
        #[source]
        source: ConnectFailure,
    },

    /// Waiting for a started daemon was interrupted
    #[error("Interrupted while waiting for the build daemon to start")]
    Interrupted,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// Specialized Result type for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

impl ConnectorError {
    /// Create a context mismatch error
    pub fn context_mismatch(explanation: impl Into<String>) -> Self {
        Self::ContextMismatch {
            explanation: explanation.into(),
        }
    }

    /// Create a startup timeout error
    pub fn startup_timeout(description: impl Into<String>) -> Self {
        Self::StartupTimeout {
            description: description.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Always `false`: recoverable connection failures never leave the
    /// connector, and retrying any of these would start another daemon.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
