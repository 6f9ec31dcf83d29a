//! `nodewatch restart`

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use nodewatch_control::Manager;

/// Arguments for `nodewatch restart`.
#[derive(Args, Debug)]
pub struct RestartArgs {}

impl RestartArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let message = Manager::from_config(&config).restart()?;
        println!("{message}");
        Ok(ExitCode::SUCCESS)
    }
}
