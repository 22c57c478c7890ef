//! `hearth status`

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use chrono::Utc;
use hearth_config::HearthConfig;
use hearth_daemon_client::stop_events::unique_recent_stop_events;
use hearth_daemon_client::{DaemonInfo, DaemonRegistry, StopEvent};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusReport {
    daemons: Vec<DaemonInfo>,
    recent_stop_events: Vec<StopEvent>,
}

pub async fn execute(config: &HearthConfig, format: OutputFormat) -> Result<()> {
    let registry = super::registry(config);
    let daemons = registry.all().await.context("Failed to read daemon registry")?;
    let stop_events = registry
        .stop_events()
        .await
        .context("Failed to read daemon registry")?;

    let report = StatusReport {
        daemons,
        recent_stop_events: unique_recent_stop_events(
            &stop_events,
            Utc::now(),
            config.connector.stop_event_retention(),
        ),
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize status")?
            );
        }
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn print_table(report: &StatusReport) {
    if report.daemons.is_empty() {
        println!("No daemons are registered");
    } else {
        println!("{:<38} {:>8} {:<6} ADDRESS", "UID", "PID", "STATE");
        for daemon in &report.daemons {
            println!(
                "{:<38} {:>8} {:<6} {}",
                daemon.uid().as_str(),
                daemon.pid().map_or_else(|| "-".to_string(), |pid| pid.to_string()),
                daemon.state.to_string(),
                daemon.address
            );
        }
    }

    if !report.recent_stop_events.is_empty() {
        println!("\nRecently stopped:");
        for event in &report.recent_stop_events {
            println!(
                "  pid {} at {} {}",
                event.pid.map_or_else(|| "-".to_string(), |pid| pid.to_string()),
                event.timestamp,
                event.reason
            );
        }
    }
}
