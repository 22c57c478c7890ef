//! `hearth prune`

use anyhow::{Context, Result};
use chrono::Utc;
use hearth_config::HearthConfig;
use hearth_daemon_client::stop_events::old_stop_events;
use hearth_daemon_client::DaemonRegistry;
use tracing::debug;

pub async fn execute(config: &HearthConfig) -> Result<()> {
    let registry = super::registry(config);
    let events = registry
        .stop_events()
        .await
        .context("Failed to read daemon registry")?;

    let old = old_stop_events(&events, Utc::now(), config.connector.stop_event_retention());
    if !old.is_empty() {
        debug!(count = old.len(), "removing old stop events");
        registry
            .remove_stop_events(&old)
            .await
            .context("Failed to update daemon registry")?;
    }

    println!("Removed {} old stop event(s)", old.len());
    Ok(())
}
