//! `nodewatch status`: per-daemon state.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use nodewatch_control::Manager;
use nodewatch_core::{manifest::to_status_line, DaemonState, DaemonStatus};

/// Arguments for `nodewatch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Ask the supervisor over the control socket instead of reading pid files.
    #[arg(long)]
    pub remote: bool,

    /// Emit machine-readable JSON.
    #[arg(long, conflicts_with = "manifest")]
    pub json: bool,

    /// Print supervisor-style lines, usable as a reference manifest.
    #[arg(long)]
    pub manifest: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "daemon")]
    daemon: String,
    #[tabled(rename = "status")]
    status: String,
}

impl StatusArgs {
    pub fn run(self, config: Option<&Path>) -> Result<ExitCode> {
        let config = super::load_config(config)?;
        let manager = Manager::from_config(&config);

        let states = if self.remote {
            manager
                .client()
                .request_status()
                .context("status request failed")?
        } else {
            manager.status().context("failed to read daemon status")?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&states)?);
        } else if self.manifest {
            for state in &states {
                println!("{}", to_status_line(state));
            }
        } else {
            print_table(&states);
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_table(states: &[DaemonState]) {
    if states.is_empty() {
        println!("No daemons configured.");
        return;
    }

    let rows = states.iter().map(|state| StatusTableRow {
        daemon: state.name.to_string(),
        status: colorize(state.status),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn colorize(status: DaemonStatus) -> String {
    match status {
        DaemonStatus::Running => status.as_str().green().to_string(),
        DaemonStatus::Stopped => status.as_str().dimmed().to_string(),
        DaemonStatus::Failed => status.as_str().red().bold().to_string(),
        DaemonStatus::Starting | DaemonStatus::Restarting => status.as_str().yellow().to_string(),
    }
}
