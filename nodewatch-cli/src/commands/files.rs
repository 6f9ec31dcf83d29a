//! `nodewatch upload`, `get-file` and `delete-file`.
//!
//! Paths are relative to the configured install root.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use nodewatch_control::Manager;

/// Arguments for `nodewatch upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Staged artifact to promote, e.g. `tmp/incoming.xml`.
    pub name: String,

    /// Final location, e.g. `etc/rules/local_rules.xml`.
    pub destination: String,

    #[arg(long, default_value = "application/xml")]
    pub content_type: String,

    /// Replace an existing destination.
    #[arg(long)]
    pub overwrite: bool,

    /// Print the upload receipt as JSON.
    #[arg(long)]
    pub json: bool,
}

impl UploadArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let receipt = Manager::from_config(&config).upload(
            &self.name,
            &self.destination,
            &self.content_type,
            self.overwrite,
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        } else {
            println!(
                "Uploaded {} ({} bytes, sha256 {})",
                receipt.path.display(),
                receipt.bytes,
                receipt.sha256
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Arguments for `nodewatch get-file`.
#[derive(Args, Debug)]
pub struct GetFileArgs {
    pub path: String,
}

impl GetFileArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let bytes = Manager::from_config(&config).get_file(&self.path)?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&bytes)
            .and_then(|()| stdout.flush())
            .context("failed to write file to stdout")?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Arguments for `nodewatch delete-file`.
#[derive(Args, Debug)]
pub struct DeleteFileArgs {
    pub path: String,
}

impl DeleteFileArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let message = Manager::from_config(&config).delete_file(&self.path)?;
        println!("{message}");
        Ok(ExitCode::SUCCESS)
    }
}
