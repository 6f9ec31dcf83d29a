//! nodewatch: health and control surface for a cluster manager node.
//!
//! # Usage
//!
//! ```text
//! nodewatch [--config <path>] healthcheck [--role master|worker] [--json]
//! nodewatch status [--json | --manifest] [--remote]
//! nodewatch validate [--type manager|agent|remote] [--file <path>] [--json]
//! nodewatch restart
//! nodewatch upload <name> <destination> [--content-type <mime>] [--overwrite] [--json]
//! nodewatch get-file <path>
//! nodewatch delete-file <path>
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default `warn` level.

mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    files::{DeleteFileArgs, GetFileArgs, UploadArgs},
    healthcheck::HealthcheckArgs,
    restart::RestartArgs,
    status::StatusArgs,
    validate::ValidateArgs,
};
use nodewatch_core::NodeRole;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "nodewatch",
    version,
    about = "Health checks and control operations for a cluster manager node",
    long_about = None,
)]
struct Cli {
    /// Config file; falls back to $NODEWATCH_CONFIG, then built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exit 0 when the node is healthy, 1 otherwise.
    Healthcheck(HealthcheckArgs),

    /// Show the state of every configured daemon.
    Status(StatusArgs),

    /// Ask the supervisor to check a configuration.
    Validate(ValidateArgs),

    /// Ask the supervisor to restart the manager.
    Restart(RestartArgs),

    /// Validate a staged file and move it into place.
    Upload(UploadArgs),

    /// Print a file under the install root to stdout.
    GetFile(GetFileArgs),

    /// Delete a file under the install root.
    DeleteFile(DeleteFileArgs),
}

// ---------------------------------------------------------------------------
// Shared NodeRole argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `NodeRole` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct RoleArg(pub NodeRole);

impl FromStr for RoleArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "master" => Ok(Self(NodeRole::Master)),
            "worker" => Ok(Self(NodeRole::Worker)),
            other => Err(format!("unknown role '{other}'; expected: master, worker")),
        }
    }
}

impl fmt::Display for RoleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<RoleArg> for NodeRole {
    fn from(r: RoleArg) -> Self {
        r.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Healthcheck(args) => Ok(args.run(config)),
        Commands::Status(args) => args.run(config),
        Commands::Validate(args) => args.run(config),
        Commands::Restart(args) => args.run(config),
        Commands::Upload(args) => args.run(config),
        Commands::GetFile(args) => args.run(config),
        Commands::DeleteFile(args) => args.run(config),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
