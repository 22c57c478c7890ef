//! Finding, connecting to and starting daemons
//!
//! [`DaemonConnector`] turns "run this somewhere compatible" into a live
//! connection to exactly one daemon:
//!
//! 1. Idle, compatible daemons from the registry are tried in order.
//! 2. Addresses that no longer answer are removed from the registry and a
//!    stop event is recorded.
//! 3. If nothing connects, a new daemon is started and the registry is
//!    polled for it until the connect timeout passes.
//!
//! Everything runs sequentially on the calling task.

use crate::clock::{Clock, SystemClock};
use crate::connection::{
    ConnectAttempt, DaemonConnection, StaleAddressDetector, StaleOutcome, StalePolicy,
};
use crate::constraint::Constraint;
use crate::daemon::{ConnectDetails, DaemonInfo, DaemonStartupInfo};
use crate::error::{ConnectorError, ConnectorResult};
use crate::progress::{DaemonStartListener, NoProgress, NoopStartListener, ProgressSink};
use crate::registry::DaemonRegistry;
use crate::selection::{compatible_daemons, partition_by_idle_state};
use crate::starter::DaemonStarter;
use crate::stop_events::{old_stop_events, startup_message, unique_recent_stop_events};
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use hearth_config::{
    ConnectorConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_STOP_EVENT_RETENTION_SECS,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Connection handle produced for transport `T`
pub type Connection<T> = DaemonConnection<<T as Transport>::Connection>;

pub struct DaemonConnector<T: Transport> {
    registry: Arc<dyn DaemonRegistry>,
    transport: T,
    starter: Arc<dyn DaemonStarter>,
    start_listener: Arc<dyn DaemonStartListener>,
    progress: Arc<dyn ProgressSink>,
    clock: Arc<dyn Clock>,
    connect_timeout: Duration,
    poll_interval: Duration,
    stop_event_retention: Duration,
}

impl<T: Transport> DaemonConnector<T> {
    pub fn new(registry: Arc<dyn DaemonRegistry>, transport: T, starter: Arc<dyn DaemonStarter>) -> Self {
        Self {
            registry,
            transport,
            starter,
            start_listener: Arc::new(NoopStartListener),
            progress: Arc::new(NoProgress),
            clock: Arc::new(SystemClock),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stop_event_retention: Duration::from_secs(DEFAULT_STOP_EVENT_RETENTION_SECS),
        }
    }

    pub fn with_config(mut self, config: &ConnectorConfig) -> Self {
        self.connect_timeout = config.connect_timeout();
        self.poll_interval = config.poll_interval();
        self.stop_event_retention = config.stop_event_retention();
        self
    }

    pub fn with_start_listener(mut self, listener: Arc<dyn DaemonStartListener>) -> Self {
        self.start_listener = listener;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn registry(&self) -> &Arc<dyn DaemonRegistry> {
        &self.registry
    }

    /// Connect to any compatible daemon already in the registry
    ///
    /// Idle and busy daemons are tried alike, in registry order. Never
    /// starts a daemon; `None` when nothing compatible answers.
    pub async fn maybe_connect<C>(&self, constraint: &C) -> ConnectorResult<Option<Connection<T>>>
    where
        C: Constraint + ?Sized,
    {
        let candidates = compatible_daemons(self.registry.all().await?, constraint);
        self.find_connection(candidates).await
    }

    /// Connect to one known daemon; `None` if its address turned out stale
    pub async fn maybe_connect_to(&self, daemon: &ConnectDetails) -> ConnectorResult<Option<Connection<T>>> {
        match self.probe(daemon).await? {
            ConnectAttempt::Connected(connection) => Ok(Some(connection)),
            ConnectAttempt::Unreachable { failure, .. } => {
                debug!("Cannot connect to {} due to {}. Ignoring.", daemon, failure);
                Ok(None)
            }
        }
    }

    /// Attempt one known daemon and report how it went
    ///
    /// Unlike [`maybe_connect_to`](Self::maybe_connect_to) the failure is
    /// handed back, so a caller can tell a removed stale address apart from
    /// a successful connection.
    pub async fn probe(&self, daemon: &ConnectDetails) -> ConnectorResult<ConnectAttempt<T::Connection>> {
        self.connect_to_daemon(daemon, StalePolicy::Expose).await
    }

    /// Connect to an idle compatible daemon, starting a new one if none answers
    ///
    /// Busy daemons are never used. Either returns a live connection or a
    /// terminal [`ConnectorError`].
    pub async fn connect<C>(&self, constraint: &C) -> ConnectorResult<Connection<T>>
    where
        C: Constraint + ?Sized,
    {
        let (idle, busy) = partition_by_idle_state(self.registry.all().await?);
        let idle_count = idle.len();

        let compatible_idle = compatible_daemons(idle, constraint);
        if let Some(connection) = self.find_connection(compatible_idle).await? {
            return Ok(connection);
        }

        let stop_events = self.registry.stop_events().await?;
        let now = self.clock.now();
        let old = old_stop_events(&stop_events, now, self.stop_event_retention);
        if !old.is_empty() {
            self.registry.remove_stop_events(&old).await?;
        }

        let recent = unique_recent_stop_events(&stop_events, now, self.stop_event_retention);
        for event in &recent {
            info!(
                "Previous daemon ({}) stopped at {} {}",
                event.pid.map_or_else(|| "unknown".to_string(), |pid| pid.to_string()),
                event.timestamp,
                event.reason
            );
        }

        info!("{}", startup_message(busy.len(), idle_count, recent.len()));

        self.start_daemon(constraint).await
    }

    /// Start a new daemon and connect to it once it has registered
    ///
    /// The deadline is fixed when the daemon has been launched. The registry
    /// is polled every poll interval until then; the daemon is found by the
    /// uid the starter assigned.
    pub async fn start_daemon<C>(&self, constraint: &C) -> ConnectorResult<Connection<T>>
    where
        C: Constraint + ?Sized,
    {
        let phase = self.progress.begin_phase("Starting daemon");
        let result = self.start_and_wait(constraint).await;
        phase.complete();
        result
    }

    async fn start_and_wait<C>(&self, constraint: &C) -> ConnectorResult<Connection<T>>
    where
        C: Constraint + ?Sized,
    {
        let startup = self.starter.start_daemon().await?;
        debug!("Started daemon {}", startup);

        let deadline = self.deadline_from(self.clock.now());
        loop {
            if let Some(connection) = self.connect_to_started_daemon(&startup, constraint).await? {
                self.start_listener.daemon_started(connection.daemon());
                return Ok(connection);
            }
            self.clock.sleep(self.poll_interval).await?;
            if self.clock.now() >= deadline {
                break;
            }
        }

        Err(ConnectorError::startup_timeout(startup.describe()))
    }

    fn deadline_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.connect_timeout)
            .ok()
            .and_then(|timeout| start.checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Look for our daemon among the busy ones: a daemon registers busy so
    /// that no other client grabs it first.
    async fn connect_to_started_daemon<C>(
        &self,
        startup: &DaemonStartupInfo,
        constraint: &C,
    ) -> ConnectorResult<Option<Connection<T>>>
    where
        C: Constraint + ?Sized,
    {
        let registered = self
            .registry
            .not_idle()
            .await?
            .into_iter()
            .find(|daemon| daemon.uid() == &startup.uid);

        let Some(daemon) = registered else {
            return Ok(None);
        };

        if !constraint.is_satisfied_by(&daemon.context) {
            return Err(ConnectorError::context_mismatch(
                constraint.why_unsatisfied(&daemon.context),
            ));
        }

        let details = ConnectDetails::from(&daemon);
        match self.connect_to_daemon(&details, StalePolicy::Escalate).await? {
            ConnectAttempt::Connected(connection) => Ok(Some(connection)),
            ConnectAttempt::Unreachable { failure, .. } => Err(ConnectorError::Connect {
                description: startup.describe().to_string(),
                source: failure,
            }),
        }
    }

    /// First candidate that accepts a connection, in order
    async fn find_connection(
        &self,
        candidates: Vec<DaemonInfo>,
    ) -> ConnectorResult<Option<Connection<T>>> {
        for daemon in &candidates {
            let details = ConnectDetails::from(daemon);
            match self.connect_to_daemon(&details, StalePolicy::Expose).await? {
                ConnectAttempt::Connected(connection) => return Ok(Some(connection)),
                ConnectAttempt::Unreachable {
                    outcome: StaleOutcome::Stale,
                    failure,
                } => {
                    debug!(
                        "Cannot connect to {} due to {}. Trying a different daemon...",
                        daemon, failure
                    );
                }
                ConnectAttempt::Unreachable {
                    outcome: StaleOutcome::Fatal,
                    failure,
                } => {
                    return Err(ConnectorError::Connect {
                        description: details.to_string(),
                        source: failure,
                    });
                }
            }
        }
        Ok(None)
    }

    async fn connect_to_daemon(
        &self,
        daemon: &ConnectDetails,
        policy: StalePolicy,
    ) -> ConnectorResult<ConnectAttempt<T::Connection>> {
        let detector = StaleAddressDetector::new(
            daemon.clone(),
            policy,
            self.registry.clone(),
            self.clock.clone(),
        );

        let phase = self.progress.begin_phase("Connecting to daemon");
        let result = self.transport.connect(&daemon.address).await;
        phase.complete();

        match result {
            Ok(connection) => Ok(ConnectAttempt::Connected(DaemonConnection::new(
                connection,
                daemon.clone(),
                detector,
            ))),
            Err(failure) => {
                let outcome = detector.maybe_stale_address(&failure).await?;
                Ok(ConnectAttempt::Unreachable { outcome, failure })
            }
        }
    }
}
