//! Test doubles for the connector's collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use hearth_daemon_client::{
    Clock, ConnectDetails, ConnectFailure, ConnectorError, ConnectorResult, DaemonAddress,
    DaemonConnector, DaemonContext, DaemonInfo, DaemonRegistry, DaemonStartListener,
    DaemonStartupInfo, DaemonStarter, DaemonState, DaemonUid, InMemoryRegistry, ManualClock,
    ProgressPhase, ProgressSink, RegistryResult, SpawnResult, StopEvent, Transport,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const RUNTIME: &str = "/opt/runtime/17";
pub const OTHER_RUNTIME: &str = "/opt/runtime/11";

pub fn address(name: &str) -> DaemonAddress {
    DaemonAddress::Socket(PathBuf::from(format!("/tmp/hearth-test/{name}.sock")))
}

pub fn daemon(name: &str, runtime: &str, state: DaemonState) -> DaemonInfo {
    DaemonInfo::new(
        address(name),
        DaemonContext {
            uid: DaemonUid::new(name),
            runtime: PathBuf::from(runtime),
            registry_dir: PathBuf::from("/tmp/hearth-test"),
            pid: Some(name.bytes().map(u32::from).sum()),
            idle_timeout_ms: Some(60_000),
            options: vec![],
        },
        state,
    )
}

/// Raw connection handed out by [`FakeTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeConnection(pub DaemonAddress);

#[derive(Default)]
struct TransportState {
    reachable: HashSet<DaemonAddress>,
    attempts: Vec<DaemonAddress>,
}

/// Connects only to addresses marked reachable and records every attempt
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn make_reachable(&self, address: DaemonAddress) {
        self.state.lock().reachable.insert(address);
    }

    pub fn attempts(&self) -> Vec<DaemonAddress> {
        self.state.lock().attempts.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Connection = FakeConnection;

    async fn connect(&self, address: &DaemonAddress) -> Result<FakeConnection, ConnectFailure> {
        let mut state = self.state.lock();
        state.attempts.push(address.clone());
        if state.reachable.contains(address) {
            Ok(FakeConnection(address.clone()))
        } else {
            Err(ConnectFailure::new(
                address.clone(),
                std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            ))
        }
    }
}

/// In-memory registry that can make a daemon appear after a number of polls
#[derive(Default)]
pub struct ScriptedRegistry {
    inner: InMemoryRegistry,
    not_idle_calls: AtomicUsize,
    pending: Mutex<Option<(usize, DaemonInfo)>>,
}

impl ScriptedRegistry {
    pub fn with_daemons(daemons: impl IntoIterator<Item = DaemonInfo>) -> Self {
        Self {
            inner: InMemoryRegistry::with_daemons(daemons),
            ..Default::default()
        }
    }

    /// Register `info` when `not_idle` is called for the `poll`-th time
    pub fn register_on_poll(&self, poll: usize, info: DaemonInfo) {
        *self.pending.lock() = Some((poll, info));
    }

    pub fn not_idle_calls(&self) -> usize {
        self.not_idle_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DaemonRegistry for ScriptedRegistry {
    async fn all(&self) -> RegistryResult<Vec<DaemonInfo>> {
        self.inner.all().await
    }

    async fn not_idle(&self) -> RegistryResult<Vec<DaemonInfo>> {
        let call = self.not_idle_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let due = {
            let mut pending = self.pending.lock();
            if pending.as_ref().is_some_and(|(poll, _)| *poll <= call) {
                pending.take().map(|(_, info)| info)
            } else {
                None
            }
        };
        if let Some(info) = due {
            self.inner.store(info).await?;
        }
        self.inner.not_idle().await
    }

    async fn stop_events(&self) -> RegistryResult<Vec<StopEvent>> {
        self.inner.stop_events().await
    }

    async fn remove_stop_events(&self, events: &[StopEvent]) -> RegistryResult<()> {
        self.inner.remove_stop_events(events).await
    }

    async fn store_stop_event(&self, event: StopEvent) -> RegistryResult<()> {
        self.inner.store_stop_event(event).await
    }

    async fn remove(&self, address: &DaemonAddress) -> RegistryResult<()> {
        self.inner.remove(address).await
    }

    async fn store(&self, info: DaemonInfo) -> RegistryResult<()> {
        self.inner.store(info).await
    }

    async fn mark_state(&self, address: &DaemonAddress, state: DaemonState) -> RegistryResult<()> {
        self.inner.mark_state(address, state).await
    }
}

/// Pretends to launch a daemon with a fixed uid
pub struct FakeStarter {
    startup: DaemonStartupInfo,
    calls: AtomicUsize,
}

impl FakeStarter {
    pub fn new(uid: &str) -> Self {
        Self {
            startup: DaemonStartupInfo {
                uid: DaemonUid::new(uid),
                pid: Some(4242),
                description: format!("Daemon uid: {uid}, pid: 4242\nLog directory: /tmp/hearth-test/logs"),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn description(&self) -> &str {
        &self.startup.description
    }
}

#[async_trait]
impl DaemonStarter for FakeStarter {
    async fn start_daemon(&self) -> SpawnResult<DaemonStartupInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.startup.clone())
    }
}

#[derive(Default)]
pub struct RecordingListener {
    started: Mutex<Vec<ConnectDetails>>,
}

impl RecordingListener {
    pub fn started(&self) -> Vec<ConnectDetails> {
        self.started.lock().clone()
    }
}

impl DaemonStartListener for RecordingListener {
    fn daemon_started(&self, daemon: &ConnectDetails) {
        self.started.lock().push(daemon.clone());
    }
}

/// Records `begin:<name>` and `end:<name>` for every phase
#[derive(Default)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

struct RecordedPhase {
    name: String,
    events: Arc<Mutex<Vec<String>>>,
}

impl ProgressPhase for RecordedPhase {
    fn complete(self: Box<Self>) {
        self.events.lock().push(format!("end:{}", self.name));
    }
}

impl ProgressSink for RecordingProgress {
    fn begin_phase(&self, name: &str) -> Box<dyn ProgressPhase> {
        self.events.lock().push(format!("begin:{name}"));
        Box::new(RecordedPhase {
            name: name.to_string(),
            events: self.events.clone(),
        })
    }
}

/// Clock whose sleeps are always interrupted
pub struct InterruptedClock(pub ManualClock);

#[async_trait]
impl Clock for InterruptedClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.0.now()
    }

    async fn sleep(&self, _duration: Duration) -> ConnectorResult<()> {
        Err(ConnectorError::Interrupted)
    }
}

/// Everything a connector under test talks to
pub struct Harness {
    pub registry: Arc<ScriptedRegistry>,
    pub transport: FakeTransport,
    pub starter: Arc<FakeStarter>,
    pub listener: Arc<RecordingListener>,
    pub progress: Arc<RecordingProgress>,
    pub clock: Arc<ManualClock>,
}

pub const SPAWNED_UID: &str = "spawned";

impl Harness {
    pub fn new(daemons: impl IntoIterator<Item = DaemonInfo>) -> Self {
        Self {
            registry: Arc::new(ScriptedRegistry::with_daemons(daemons)),
            transport: FakeTransport::default(),
            starter: Arc::new(FakeStarter::new(SPAWNED_UID)),
            listener: Arc::new(RecordingListener::default()),
            progress: Arc::new(RecordingProgress::default()),
            clock: Arc::new(ManualClock::default()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<DaemonInfo>::new())
    }

    pub fn connector(&self) -> DaemonConnector<FakeTransport> {
        DaemonConnector::new(
            self.registry.clone(),
            self.transport.clone(),
            self.starter.clone(),
        )
        .with_start_listener(self.listener.clone())
        .with_progress(self.progress.clone())
        .with_clock(self.clock.clone())
    }

    /// The daemon [`FakeStarter`] launches, as it registers itself
    pub fn spawned(&self, runtime: &str) -> DaemonInfo {
        daemon(SPAWNED_UID, runtime, DaemonState::Busy)
    }
}
