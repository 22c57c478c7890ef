//! Stop events: why daemons went away, kept for a while for diagnostics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Reason recorded when the connector finds a daemon's address dead
pub const STOPPED_BY_USER_OR_OS: &str = "by user or operating system";

/// Record that a daemon stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEvent {
    pub timestamp: DateTime<Utc>,
    pub pid: Option<u32>,
    pub reason: String,
}

impl StopEvent {
    pub fn new(timestamp: DateTime<Utc>, pid: Option<u32>, reason: impl Into<String>) -> Self {
        Self {
            timestamp,
            pid,
            reason: reason.into(),
        }
    }
}

fn cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(retention)
        .ok()
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Events older than `retention`, ready to be pruned
pub fn old_stop_events(
    events: &[StopEvent],
    now: DateTime<Utc>,
    retention: Duration,
) -> Vec<StopEvent> {
    let cutoff = cutoff(now, retention);
    events
        .iter()
        .filter(|event| event.timestamp < cutoff)
        .cloned()
        .collect()
}

/// Events within `retention`, latest per pid, newest first
pub fn unique_recent_stop_events(
    events: &[StopEvent],
    now: DateTime<Utc>,
    retention: Duration,
) -> Vec<StopEvent> {
    let cutoff = cutoff(now, retention);
    let mut latest: HashMap<Option<u32>, &StopEvent> = HashMap::new();
    for event in events.iter().filter(|event| event.timestamp >= cutoff) {
        latest
            .entry(event.pid)
            .and_modify(|current| {
                if event.timestamp > current.timestamp {
                    *current = event;
                }
            })
            .or_insert(event);
    }

    let mut recent: Vec<StopEvent> = latest.into_values().cloned().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent
}

/// Operator-facing line printed before a new daemon is started
pub fn startup_message(busy: usize, incompatible: usize, stopped: usize) -> String {
    const STARTING: &str = "Starting a build daemon";

    let total = busy + incompatible + stopped;
    if total == 0 {
        return format!("{STARTING} (subsequent builds will be faster)");
    }

    let parts: Vec<String> = [(busy, "busy"), (incompatible, "incompatible"), (stopped, "stopped")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();
    let noun = if total == 1 { "daemon" } else { "daemons" };

    format!(
        "{STARTING}, {} {noun} could not be reused, use `hearth status` for details",
        parts.join(" and ")
    )
}
