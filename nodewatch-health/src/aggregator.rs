//! Health aggregation.
//!
//! A node is healthy when its daemon snapshot matches the manifest for its
//! role AND its log shows the readiness marker. Both checks always run so the
//! verdict lists every reason at once. Any ambiguity (no manifest, probe
//! failure, unreadable log) counts as unhealthy.

use std::collections::HashMap;
use std::path::PathBuf;

use nodewatch_core::{Config, HealthVerdict, NodeManifest, NodeRole, ProcessStatusProvider};

use crate::comparator;
use crate::readiness::LogReadinessProbe;

/// Stateless evaluator; one call per scheduler tick.
pub struct HealthChecker<P> {
    provider: P,
    manifests: HashMap<NodeRole, NodeManifest>,
    log_path: PathBuf,
    probe: LogReadinessProbe,
}

impl<P: ProcessStatusProvider> HealthChecker<P> {
    pub fn new(provider: P, log_path: PathBuf, probe: LogReadinessProbe) -> Self {
        Self {
            provider,
            manifests: HashMap::new(),
            log_path,
            probe,
        }
    }

    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(
            provider,
            config.api_log_path(),
            LogReadinessProbe::from_config(config),
        )
    }

    /// Register the manifest for its role, replacing any earlier one.
    pub fn with_manifest(mut self, manifest: NodeManifest) -> Self {
        self.manifests.insert(manifest.role(), manifest);
        self
    }

    /// `true` when the node is healthy for `role`.
    pub fn check(&self, role: NodeRole) -> bool {
        self.evaluate(role).passed
    }

    pub fn evaluate(&self, role: NodeRole) -> HealthVerdict {
        let mut reasons = self.daemon_reasons(role);

        if !self.probe.ready(&self.log_path) {
            reasons.push(format!(
                "readiness marker {:?} not found in {}",
                self.probe.marker(),
                self.log_path.display()
            ));
        }

        if reasons.is_empty() {
            tracing::debug!(role = %role, "node healthy");
            HealthVerdict::healthy()
        } else {
            tracing::warn!(role = %role, reasons = ?reasons, "node unhealthy");
            HealthVerdict::unhealthy(reasons)
        }
    }

    fn daemon_reasons(&self, role: NodeRole) -> Vec<String> {
        let Some(manifest) = self.manifests.get(&role) else {
            return vec![format!("no daemon manifest loaded for {role}")];
        };
        match self.provider.snapshot() {
            Ok(live) => comparator::differences(&live, manifest)
                .iter()
                .map(ToString::to_string)
                .collect(),
            Err(err) => vec![format!("daemon status unavailable: {err}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_core::{CoreError, DaemonState, DaemonStatus};
    use rstest::rstest;
    use tempfile::TempDir;

    struct FakeProvider(Result<Vec<DaemonState>, String>);

    impl ProcessStatusProvider for FakeProvider {
        fn snapshot(&self) -> Result<Vec<DaemonState>, CoreError> {
            self.0.clone().map_err(CoreError::Probe)
        }
    }

    fn manifest(role: NodeRole, status: DaemonStatus) -> NodeManifest {
        NodeManifest::new(role, vec![DaemonState::new("ossec-monitord", status)]).expect("manifest")
    }

    fn log_dir(with_marker: bool) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("api.log");
        let body = if with_marker {
            "INFO: Listening on 0.0.0.0:55000..\n"
        } else {
            "INFO: loading configuration\n"
        };
        std::fs::write(&log, body).expect("write log");
        (dir, log)
    }

    fn checker(live: DaemonStatus, log: PathBuf) -> HealthChecker<FakeProvider> {
        HealthChecker::new(
            FakeProvider(Ok(vec![DaemonState::new("ossec-monitord", live)])),
            log,
            LogReadinessProbe::new("Listening on ", 4096),
        )
        .with_manifest(manifest(NodeRole::Master, DaemonStatus::Running))
        .with_manifest(manifest(NodeRole::Worker, DaemonStatus::Running))
    }

    #[rstest]
    fn healthy_iff_match_and_ready(
        #[values(NodeRole::Master, NodeRole::Worker)] role: NodeRole,
        #[values(true, false)] daemons_match: bool,
        #[values(true, false)] marker_present: bool,
    ) {
        let (_dir, log) = log_dir(marker_present);
        let live = if daemons_match {
            DaemonStatus::Running
        } else {
            DaemonStatus::Failed
        };
        let verdict = checker(live, log).evaluate(role);
        assert_eq!(verdict.passed, daemons_match && marker_present);
        assert_eq!(verdict.exit_code(), if verdict.passed { 0 } else { 1 });
        let expected_reasons = usize::from(!daemons_match) + usize::from(!marker_present);
        assert_eq!(verdict.reasons.len(), expected_reasons);
    }

    #[test]
    fn running_vs_stopped_manifest_is_unhealthy_even_when_ready() {
        let (_dir, log) = log_dir(true);
        let checker = HealthChecker::new(
            FakeProvider(Ok(vec![DaemonState::new("ossec-monitord", DaemonStatus::Running)])),
            log,
            LogReadinessProbe::new("Listening on ", 4096),
        )
        .with_manifest(manifest(NodeRole::Master, DaemonStatus::Stopped));
        assert!(!checker.check(NodeRole::Master));
    }

    #[test]
    fn probe_error_is_unhealthy() {
        let (_dir, log) = log_dir(true);
        let checker = HealthChecker::new(
            FakeProvider(Err("ps unavailable".to_string())),
            log,
            LogReadinessProbe::new("Listening on ", 4096),
        )
        .with_manifest(manifest(NodeRole::Worker, DaemonStatus::Running));
        let verdict = checker.evaluate(NodeRole::Worker);
        assert!(!verdict.passed);
        assert!(verdict.reasons[0].contains("ps unavailable"));
    }

    #[test]
    fn missing_manifest_for_role_is_unhealthy() {
        let (_dir, log) = log_dir(true);
        let checker = HealthChecker::new(
            FakeProvider(Ok(vec![])),
            log,
            LogReadinessProbe::new("Listening on ", 4096),
        )
        .with_manifest(manifest(NodeRole::Master, DaemonStatus::Running));
        assert!(!checker.check(NodeRole::Worker));
    }
}
