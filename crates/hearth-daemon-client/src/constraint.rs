//! Compatibility constraints over a daemon's context

use crate::daemon::DaemonContext;
use std::path::PathBuf;

/// Decides which daemons may serve a request, and explains rejections
pub trait Constraint: Send + Sync {
    fn is_satisfied_by(&self, context: &DaemonContext) -> bool;

    /// Human-readable reason `context` was rejected
    fn why_unsatisfied(&self, context: &DaemonContext) -> String;
}

/// Accepts every daemon
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyDaemon;

impl Constraint for AnyDaemon {
    fn is_satisfied_by(&self, _context: &DaemonContext) -> bool {
        true
    }

    fn why_unsatisfied(&self, _context: &DaemonContext) -> String {
        String::new()
    }
}

/// Constraint that accepts every daemon
pub fn any() -> AnyDaemon {
    AnyDaemon
}

/// A daemon is compatible when it runs the same runtime with the same options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilitySpec {
    pub runtime: PathBuf,
    pub options: Vec<String>,
}

impl CompatibilitySpec {
    pub fn new(runtime: impl Into<PathBuf>, options: Vec<String>) -> Self {
        Self {
            runtime: runtime.into(),
            options,
        }
    }

    /// Requirement built from the daemon launch configuration
    pub fn from_config(config: &hearth_config::DaemonConfig) -> Self {
        Self::new(config.resolved_runtime(), config.options.clone())
    }

    fn runtime_matches(&self, context: &DaemonContext) -> bool {
        self.runtime == context.runtime
    }

    fn options_match(&self, context: &DaemonContext) -> bool {
        self.options == context.options
    }
}

impl Constraint for CompatibilitySpec {
    fn is_satisfied_by(&self, context: &DaemonContext) -> bool {
        self.runtime_matches(context) && self.options_match(context)
    }

    fn why_unsatisfied(&self, context: &DaemonContext) -> String {
        let mut reasons = Vec::new();
        if !self.runtime_matches(context) {
            reasons.push(format!(
                "Runtime is different.\nWanted: {}\nActual: {}",
                self.runtime.display(),
                context.runtime.display()
            ));
        }
        if !self.options_match(context) {
            reasons.push(format!(
                "Daemon options are different.\nWanted: {:?}\nActual: {:?}",
                self.options, context.options
            ));
        }
        reasons.join("\n")
    }
}
