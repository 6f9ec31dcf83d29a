//! `nodewatch validate`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use nodewatch_control::{ConfigKind, Manager, ValidateTarget};

/// Arguments for `nodewatch validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration to check: manager, agent or remote.
    #[arg(long = "type", default_value = "manager")]
    pub kind: ConfigKind,

    /// Check this file instead of the default one for the type.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let manager = Manager::from_config(&config);
        let target = ValidateTarget {
            kind: self.kind,
            file: self.file,
        };

        let report = manager
            .validate(&target)
            .with_context(|| format!("could not validate {} configuration", target.kind))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.is_ok() {
            println!("{} {} configuration is valid", "OK".green(), target.kind);
        } else {
            println!("{} {} configuration has errors", "KO".red().bold(), target.kind);
            for detail in &report.details {
                println!("  {detail}");
            }
        }

        Ok(if report.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
