//! Daemon descriptors as stored in the registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Identity of one daemon process for its whole lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaemonUid(String);

impl DaemonUid {
    /// Wrap an existing identity
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Mint a fresh identity for a daemon about to be started
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DaemonUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Endpoint a daemon advertises for incoming connections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonAddress {
    /// Unix domain socket path
    Socket(PathBuf),
    /// TCP endpoint, usually on loopback
    Tcp(SocketAddr),
}

impl fmt::Display for DaemonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(path) => write!(f, "unix:{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// Immutable attributes a daemon was started with
///
/// Requests are matched against these by a [`Constraint`](crate::Constraint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonContext {
    pub uid: DaemonUid,
    /// Runtime home the daemon executes builds with
    pub runtime: PathBuf,
    /// Registry directory the daemon registered itself in
    pub registry_dir: PathBuf,
    pub pid: Option<u32>,
    pub idle_timeout_ms: Option<u64>,
    /// Options the daemon process was launched with
    #[serde(default)]
    pub options: Vec<String>,
}

/// Availability as last reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    Idle,
    Busy,
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Busy => f.write_str("busy"),
        }
    }
}

/// Registry entry for one daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonInfo {
    pub address: DaemonAddress,
    pub context: DaemonContext,
    pub state: DaemonState,
}

impl DaemonInfo {
    pub fn new(address: DaemonAddress, context: DaemonContext, state: DaemonState) -> Self {
        Self {
            address,
            context,
            state,
        }
    }

    pub fn uid(&self) -> &DaemonUid {
        &self.context.uid
    }

    pub fn pid(&self) -> Option<u32> {
        self.context.pid
    }

    pub fn is_idle(&self) -> bool {
        self.state == DaemonState::Idle
    }
}

impl fmt::Display for DaemonInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DaemonInfo{{pid={}, address={}, state={}, runtime={}}}",
            display_pid(self.pid()),
            self.address,
            self.state,
            self.context.runtime.display()
        )
    }
}

/// Just enough to open a connection to a daemon
///
/// Used for registry entries and for a spawned daemon before it has fully
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectDetails {
    pub uid: DaemonUid,
    pub pid: Option<u32>,
    pub address: DaemonAddress,
}

impl From<&DaemonInfo> for ConnectDetails {
    fn from(info: &DaemonInfo) -> Self {
        Self {
            uid: info.uid().clone(),
            pid: info.pid(),
            address: info.address.clone(),
        }
    }
}

impl fmt::Display for ConnectDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "daemon {} (pid {}) at {}",
            self.uid,
            display_pid(self.pid),
            self.address
        )
    }
}

/// What a spawner knows about a daemon it has just launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStartupInfo {
    /// Correlation key: the daemon registers itself under this uid
    pub uid: DaemonUid,
    pub pid: Option<u32>,
    /// Human-readable diagnostics shown when the daemon never comes up
    pub description: String,
}

impl DaemonStartupInfo {
    pub fn describe(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for DaemonStartupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daemon {} (pid {})", self.uid, display_pid(self.pid))
    }
}

fn display_pid(pid: Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_string(), |pid| pid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(state: DaemonState) -> DaemonInfo {
        DaemonInfo::new(
            DaemonAddress::Socket(PathBuf::from("/tmp/hearth/d1.sock")),
            DaemonContext {
                uid: DaemonUid::new("d1"),
                runtime: PathBuf::from("/opt/runtime"),
                registry_dir: PathBuf::from("/tmp/hearth"),
                pid: Some(42),
                idle_timeout_ms: None,
                options: vec![],
            },
            state,
        )
    }

    #[test]
    fn test_generated_uids_are_unique() {
        assert_ne!(DaemonUid::generate(), DaemonUid::generate());
    }

    #[test]
    fn test_connect_details_from_info() {
        let details = ConnectDetails::from(&info(DaemonState::Busy));
        assert_eq!(details.uid, DaemonUid::new("d1"));
        assert_eq!(details.pid, Some(42));
        assert_eq!(details.to_string(), "daemon d1 (pid 42) at unix:/tmp/hearth/d1.sock");
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&info(DaemonState::Idle)).unwrap();
        assert!(json.contains(r#""state":"idle""#));
        assert!(json.contains(r#""socket":"/tmp/hearth/d1.sock""#));
    }
}
