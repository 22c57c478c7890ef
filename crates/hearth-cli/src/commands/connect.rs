//! `hearth connect`

use anyhow::{Context, Result};
use hearth_config::HearthConfig;
use hearth_daemon_client::{CompatibilitySpec, ConnectDetails};

pub async fn execute(config: &HearthConfig, no_start: bool) -> Result<()> {
    let connector = super::build_connector(config);
    let constraint = CompatibilitySpec::from_config(&config.daemon);

    let connection = if no_start {
        connector
            .maybe_connect(&constraint)
            .await
            .context("Failed to look up running daemons")?
            .context("No compatible daemon is running")?
    } else {
        connector
            .connect(&constraint)
            .await
            .context("Failed to connect to a build daemon")?
    };

    print_daemon(connection.daemon());
    Ok(())
}

fn print_daemon(daemon: &ConnectDetails) {
    println!("Connected to daemon {}", daemon.uid);
    if let Some(pid) = daemon.pid {
        println!("  pid:     {}", pid);
    }
    println!("  address: {}", daemon.address);
}
