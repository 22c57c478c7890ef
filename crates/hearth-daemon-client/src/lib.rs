//! Client library for finding and connecting to Hearth build daemons
//!
//! Daemons are long-lived worker processes kept warm across builds. They
//! advertise themselves in a shared registry; this crate picks one that is
//! compatible with the request, connects to it, and starts a new one when
//! none answers.
//!
//! Daemon detection is registry-based:
//! - If an idle compatible daemon accepts a connection -> use it
//! - If its address refuses -> stale entry, removed and a stop event recorded
//! - If none connects -> start a daemon and wait for it to register
//!
//! The registry, transport and process spawner are traits; [`FileRegistry`],
//! [`SocketTransport`] and [`CommandSpawner`] are the default implementations.

mod clock;
mod connection;
pub mod constraint;
mod connector;
mod daemon;
mod error;
mod progress;
pub mod registry;
pub mod selection;
mod starter;
pub mod stop_events;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{
    ConnectAttempt, DaemonConnection, StaleAddressDetector, StaleOutcome, StalePolicy,
};
pub use constraint::{CompatibilitySpec, Constraint};
pub use connector::{Connection, DaemonConnector};
pub use daemon::{
    ConnectDetails, DaemonAddress, DaemonContext, DaemonInfo, DaemonStartupInfo, DaemonState,
    DaemonUid,
};
pub use error::{ConnectorError, ConnectorResult};
pub use progress::{
    DaemonStartListener, LoggingStartListener, NoProgress, NoopStartListener, ProgressPhase,
    ProgressSink, TracingProgress,
};
pub use registry::{DaemonRegistry, FileRegistry, InMemoryRegistry, RegistryError, RegistryResult};
pub use starter::{CommandSpawner, DaemonStarter, SpawnError, SpawnResult};
pub use stop_events::StopEvent;
pub use transport::{ConnectFailure, DaemonStream, SocketTransport, Transport};
