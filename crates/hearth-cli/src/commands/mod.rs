//! Subcommand implementations

pub mod connect;
pub mod prune;
pub mod status;

use hearth_config::HearthConfig;
use hearth_daemon_client::{
    CommandSpawner, DaemonConnector, FileRegistry, LoggingStartListener, SocketTransport,
    TracingProgress,
};
use std::sync::Arc;

/// Registry named by the configuration
pub fn registry(config: &HearthConfig) -> Arc<FileRegistry> {
    Arc::new(FileRegistry::new(config.registry.resolved_path()))
}

/// Connector wired to the file registry, socket transport and process spawner
pub fn build_connector(config: &HearthConfig) -> DaemonConnector<SocketTransport> {
    let registry_path = config.registry.resolved_path();
    let starter = CommandSpawner::from_config(&config.daemon, &registry_path);

    DaemonConnector::new(registry(config), SocketTransport, Arc::new(starter))
        .with_config(&config.connector)
        .with_start_listener(Arc::new(LoggingStartListener))
        .with_progress(Arc::new(TracingProgress))
}
