//! Configuration with CLI overrides applied

use crate::cli::Cli;
use anyhow::{Context, Result};
use hearth_config::HearthConfig;

/// Load configuration with precedence: defaults < file < env < args
pub fn load(cli: &Cli) -> Result<HearthConfig> {
    let mut config = HearthConfig::load(cli.config.clone()).context("Failed to load configuration")?;

    if let Some(registry) = &cli.registry {
        config.registry.path = Some(registry.clone());
    }
    if let Some(timeout) = cli.connect_timeout {
        config.connector.connect_timeout_ms = timeout;
    }

    Ok(config)
}
