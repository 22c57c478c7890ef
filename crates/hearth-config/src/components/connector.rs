//! Connector timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time to wait for a freshly started daemon to register and accept a connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

/// Default delay between registry polls while waiting for a started daemon.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Stop events older than this are pruned from the registry.
pub const DEFAULT_STOP_EVENT_RETENTION_SECS: u64 = 60 * 60;

/// Timing knobs for the daemon connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Milliseconds to wait for a started daemon before giving up
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Milliseconds between registry polls while a daemon starts
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Seconds a stop event is kept for diagnostics
    #[serde(default = "default_stop_event_retention")]
    pub stop_event_retention_secs: u64,
}

fn default_connect_timeout() -> u64 { DEFAULT_CONNECT_TIMEOUT_MS }
fn default_poll_interval() -> u64 { DEFAULT_POLL_INTERVAL_MS }
fn default_stop_event_retention() -> u64 { DEFAULT_STOP_EVENT_RETENTION_SECS }

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            stop_event_retention_secs: DEFAULT_STOP_EVENT_RETENTION_SECS,
        }
    }
}

impl ConnectorConfig {
    /// Connect timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Stop-event retention as a [`Duration`]
    pub fn stop_event_retention(&self) -> Duration {
        Duration::from_secs(self.stop_event_retention_secs)
    }
}
