//! Launching new daemon processes
//!
//! A starter returns as soon as the OS process exists. The daemon is not
//! necessarily listening yet; the connector waits for it to register.

use crate::daemon::{DaemonStartupInfo, DaemonUid};
use async_trait::async_trait;
use hearth_config::DaemonConfig;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Daemon launch errors
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Failed to spawn daemon process {program}: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },
}

/// Specialized Result type for daemon launches
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Launches a new daemon process
#[async_trait]
pub trait DaemonStarter: Send + Sync {
    async fn start_daemon(&self) -> SpawnResult<DaemonStartupInfo>;
}

/// Starts the configured daemon program as a detached child process
///
/// The program receives `--uid <uid> --registry <path> --idle-timeout <ms>`
/// after the configured arguments, and is expected to register itself in
/// the registry under that uid, in the busy state.
#[derive(Debug, Clone)]
pub struct CommandSpawner {
    program: PathBuf,
    args: Vec<String>,
    registry: PathBuf,
    idle_timeout_ms: u64,
    log_dir: PathBuf,
}

impl CommandSpawner {
    pub fn new(program: impl Into<PathBuf>, registry: impl Into<PathBuf>) -> Self {
        let defaults = DaemonConfig::default();
        Self {
            program: program.into(),
            args: Vec::new(),
            registry: registry.into(),
            idle_timeout_ms: defaults.idle_timeout_ms,
            log_dir: defaults.resolved_log_dir(),
        }
    }

    pub fn from_config(config: &DaemonConfig, registry: impl Into<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            registry: registry.into(),
            idle_timeout_ms: config.idle_timeout_ms,
            log_dir: config.resolved_log_dir(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn command_line(&self, uid: &DaemonUid) -> Vec<String> {
        let mut line = self.args.clone();
        line.extend([
            "--uid".to_string(),
            uid.to_string(),
            "--registry".to_string(),
            self.registry.display().to_string(),
            "--idle-timeout".to_string(),
            self.idle_timeout_ms.to_string(),
        ]);
        line
    }

    fn describe(&self, uid: &DaemonUid, pid: u32, args: &[String]) -> String {
        format!(
            "Daemon uid: {uid}, pid: {pid}\nCommand: {} {}\nLog directory: {}",
            self.program.display(),
            args.join(" "),
            self.log_dir.display()
        )
    }
}

#[async_trait]
impl DaemonStarter for CommandSpawner {
    async fn start_daemon(&self) -> SpawnResult<DaemonStartupInfo> {
        let uid = DaemonUid::generate();
        let args = self.command_line(&uid);

        debug!(
            "Spawning daemon: {} {}",
            self.program.display(),
            args.join(" ")
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpawnError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let pid = child.id();
        info!(%uid, pid, "Spawned daemon process");

        Ok(DaemonStartupInfo {
            description: self.describe(&uid, pid, &args),
            uid,
            pid: Some(pid),
        })
    }
}
