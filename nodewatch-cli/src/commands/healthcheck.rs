//! `nodewatch healthcheck`: the container probe entry point.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use nodewatch_core::{HealthVerdict, NodeManifest, NodeRole, PidFileStatusSource};
use nodewatch_health::HealthChecker;

use crate::RoleArg;

/// Arguments for `nodewatch healthcheck`.
#[derive(Args, Debug)]
pub struct HealthcheckArgs {
    /// Skip host-name detection and check as this role.
    #[arg(long)]
    pub role: Option<RoleArg>,

    /// Emit the verdict as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl HealthcheckArgs {
    /// Never fails: anything that prevents a verdict is itself unhealthy.
    pub fn run(self, config: Option<&Path>) -> ExitCode {
        let verdict = match self.evaluate(config) {
            Ok(verdict) => verdict,
            Err(err) => HealthVerdict::unhealthy(vec![format!("{err:#}")]),
        };

        if self.json {
            match serde_json::to_string_pretty(&verdict) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("failed to encode verdict: {err}"),
            }
        } else {
            for reason in &verdict.reasons {
                eprintln!("unhealthy: {reason}");
            }
        }

        ExitCode::from(verdict.exit_code() as u8)
    }

    fn evaluate(&self, config: Option<&Path>) -> Result<HealthVerdict> {
        let config = super::load_config(config)?;
        let role: NodeRole = match self.role {
            Some(role) => role.into(),
            None => super::detect_role(&config)?,
        };
        let manifest = NodeManifest::load_at(&config.manifest_dir_path(), role)?;
        let checker = HealthChecker::from_config(PidFileStatusSource::from_config(&config), &config)
            .with_manifest(manifest);
        Ok(checker.evaluate(role))
    }
}
