use anyhow::Result;
use clap::Parser;
use tracing::debug;

use hearth_cli::{
    cli::{Cli, Commands},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays parseable
    let level = cli.level_filter();
    let env_filter = format!("hearth={level},hearth_cli={level},hearth_daemon_client={level},hearth_config={level}");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(&cli)?;
    debug!(registry = %config.registry.resolved_path().display(), "configuration loaded");

    match cli.command {
        Commands::Connect { no_start } => commands::connect::execute(&config, no_start).await,
        Commands::Status { format } => commands::status::execute(&config, format).await,
        Commands::Prune => commands::prune::execute(&config).await,
    }
}
