//! Choosing candidate daemons from a registry snapshot

use crate::constraint::Constraint;
use crate::daemon::DaemonInfo;
use tracing::info;

/// Daemons whose context satisfies `constraint`, in their original order
///
/// Every rejected daemon is logged with the constraint's explanation so an
/// operator can see why a running daemon was not used.
pub fn compatible_daemons<C>(
    daemons: impl IntoIterator<Item = DaemonInfo>,
    constraint: &C,
) -> Vec<DaemonInfo>
where
    C: Constraint + ?Sized,
{
    daemons
        .into_iter()
        .filter(|daemon| {
            let satisfied = constraint.is_satisfied_by(&daemon.context);
            if !satisfied {
                info!(
                    uid = %daemon.uid(),
                    "Found daemon {} however its context does not match the desired criteria.\n{}\n  Looking for a different daemon...",
                    daemon,
                    constraint.why_unsatisfied(&daemon.context)
                );
            }
            satisfied
        })
        .collect()
}

/// Split into `(idle, not idle)`, each keeping registry order
pub fn partition_by_idle_state(
    daemons: impl IntoIterator<Item = DaemonInfo>,
) -> (Vec<DaemonInfo>, Vec<DaemonInfo>) {
    daemons.into_iter().partition(DaemonInfo::is_idle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::CompatibilitySpec;
    use crate::daemon::{DaemonAddress, DaemonContext, DaemonState, DaemonUid};
    use proptest::prelude::*;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    fn daemon(index: usize, runtime: &str, state: DaemonState) -> DaemonInfo {
        DaemonInfo::new(
            DaemonAddress::Socket(PathBuf::from(format!("/tmp/hearth/{index}.sock"))),
            DaemonContext {
                uid: DaemonUid::new(format!("daemon-{index}")),
                runtime: PathBuf::from(runtime),
                registry_dir: PathBuf::from("/tmp/hearth"),
                pid: Some(1000 + index as u32),
                idle_timeout_ms: None,
                options: vec![],
            },
            state,
        )
    }

    fn arb_daemons() -> impl Strategy<Value = Vec<DaemonInfo>> {
        prop::collection::vec((prop::bool::ANY, prop::bool::ANY), 0..24).prop_map(|flags| {
            flags
                .into_iter()
                .enumerate()
                .map(|(i, (matches, idle))| {
                    let runtime = if matches { "/opt/jdk17" } else { "/opt/jdk11" };
                    let state = if idle { DaemonState::Idle } else { DaemonState::Busy };
                    daemon(i, runtime, state)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_filter_keeps_exactly_satisfying_in_order(daemons in arb_daemons()) {
            let spec = CompatibilitySpec::new("/opt/jdk17", vec![]);
            let expected: Vec<_> = daemons
                .iter()
                .filter(|d| spec.is_satisfied_by(&d.context))
                .cloned()
                .collect();

            prop_assert_eq!(compatible_daemons(daemons, &spec), expected);
        }

        #[test]
        fn prop_partition_is_exact_split(daemons in arb_daemons()) {
            let (idle, busy) = partition_by_idle_state(daemons.clone());

            prop_assert_eq!(idle.len() + busy.len(), daemons.len());
            prop_assert!(idle.iter().all(|d| d.state == DaemonState::Idle));
            prop_assert!(busy.iter().all(|d| d.state != DaemonState::Idle));

            let expected_idle: Vec<_> = daemons.iter().filter(|d| d.is_idle()).cloned().collect();
            let expected_busy: Vec<_> = daemons.iter().filter(|d| !d.is_idle()).cloned().collect();
            prop_assert_eq!(idle, expected_idle);
            prop_assert_eq!(busy, expected_busy);
        }
    }

    #[test]
    #[traced_test]
    fn test_rejected_daemons_are_explained() {
        let spec = CompatibilitySpec::new("/opt/jdk17", vec![]);
        let daemons = vec![
            daemon(0, "/opt/jdk17", DaemonState::Idle),
            daemon(1, "/opt/jdk11", DaemonState::Idle),
        ];

        let compatible = compatible_daemons(daemons, &spec);

        assert_eq!(compatible.len(), 1);
        assert!(logs_contain("does not match the desired criteria"));
        assert!(logs_contain("Actual: /opt/jdk11"));
        assert!(!logs_contain("daemon-0"));
    }

    #[test]
    fn test_empty_input() {
        let (idle, busy) = partition_by_idle_state(Vec::new());
        assert!(idle.is_empty() && busy.is_empty());
        assert!(compatible_daemons(Vec::new(), &crate::constraint::any()).is_empty());
    }
}
