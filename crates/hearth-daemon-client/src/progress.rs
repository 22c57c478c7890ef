//! Progress reporting and start notifications
//!
//! Neither hook influences control flow; they exist for presentation.

use crate::daemon::ConnectDetails;
use std::time::Instant;
use tracing::{debug, info};

/// Receives the "starting" and "connecting" phases
pub trait ProgressSink: Send + Sync {
    fn begin_phase(&self, name: &str) -> Box<dyn ProgressPhase>;
}

/// A running phase; completing consumes it
pub trait ProgressPhase: Send {
    fn complete(self: Box<Self>);
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin_phase(&self, _name: &str) -> Box<dyn ProgressPhase> {
        Box::new(NoPhase)
    }
}

struct NoPhase;

impl ProgressPhase for NoPhase {
    fn complete(self: Box<Self>) {}
}

/// Logs each phase with its duration
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn begin_phase(&self, name: &str) -> Box<dyn ProgressPhase> {
        debug!("{}...", name);
        Box::new(TracedPhase {
            name: name.to_string(),
            started: Instant::now(),
        })
    }
}

struct TracedPhase {
    name: String,
    started: Instant,
}

impl ProgressPhase for TracedPhase {
    fn complete(self: Box<Self>) {
        debug!(elapsed_ms = self.started.elapsed().as_millis() as u64, "{} done", self.name);
    }
}

/// Told about every daemon this client started and connected to
pub trait DaemonStartListener: Send + Sync {
    fn daemon_started(&self, daemon: &ConnectDetails);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStartListener;

impl DaemonStartListener for NoopStartListener {
    fn daemon_started(&self, _daemon: &ConnectDetails) {}
}

/// Logs started daemons at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingStartListener;

impl DaemonStartListener for LoggingStartListener {
    fn daemon_started(&self, daemon: &ConnectDetails) {
        info!(uid = %daemon.uid, "Started and connected to {}", daemon);
    }
}
