//! Daemon status source.
//!
//! [`ProcessStatusProvider`] is the seam between health checks and the host:
//! the aggregator only ever sees a list of [`DaemonState`]s.
//! [`PidFileStatusSource`] is the native implementation. It reads the
//! supervisor's run directory and the process table.
//!
//! Status precedence per daemon:
//! 1. `running`: a `<name>-<pid>.pid` file exists and `/proc/<pid>` exists
//! 2. `failed`: `<name>.failed` marker
//! 3. `restarting`: `<name>.restart` or the global `.restart` marker
//! 4. `starting`: `<name>.start` marker
//! 5. `failed`: a PID file whose process is gone
//! 6. `stopped`

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::CoreError;
use crate::paths;
use crate::types::{DaemonName, DaemonState, DaemonStatus};

/// Capability: produce a fresh snapshot of daemon states.
///
/// Implementations must be idempotent: with no daemon state change, repeated
/// calls return identical output.
pub trait ProcessStatusProvider {
    fn snapshot(&self) -> Result<Vec<DaemonState>, CoreError>;
}

impl<T: ProcessStatusProvider + ?Sized> ProcessStatusProvider for &T {
    fn snapshot(&self) -> Result<Vec<DaemonState>, CoreError> {
        (**self).snapshot()
    }
}

impl<T: ProcessStatusProvider + ?Sized> ProcessStatusProvider for Box<T> {
    fn snapshot(&self) -> Result<Vec<DaemonState>, CoreError> {
        (**self).snapshot()
    }
}

/// PID-file + `/proc` backed status source.
#[derive(Debug, Clone)]
pub struct PidFileStatusSource {
    run_dir: PathBuf,
    proc_root: PathBuf,
    daemons: Vec<DaemonName>,
}

impl PidFileStatusSource {
    pub fn new(run_dir: PathBuf, proc_root: PathBuf, daemons: Vec<DaemonName>) -> Self {
        Self {
            run_dir,
            proc_root,
            daemons,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.run_dir(), paths::proc_root(), config.daemons.clone())
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn run_dir_entries(&self) -> Result<HashSet<String>, CoreError> {
        let read = match std::fs::read_dir(&self.run_dir) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.run_dir.display(), "run directory missing; all daemons stopped");
                return Ok(HashSet::new());
            }
            Err(err) => {
                return Err(CoreError::Probe(format!(
                    "cannot list {}: {err}",
                    self.run_dir.display()
                )))
            }
        };

        let mut names = HashSet::new();
        for entry in read {
            let entry = entry.map_err(|err| {
                CoreError::Probe(format!("cannot list {}: {err}", self.run_dir.display()))
            })?;
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn status_of(&self, daemon: &DaemonName, entries: &HashSet<String>) -> DaemonStatus {
        let pids = pids_for(daemon, entries);
        if pids.iter().any(|pid| self.proc_root.join(pid).exists()) {
            return DaemonStatus::Running;
        }

        let marker = |suffix: &str| entries.contains(&format!("{daemon}.{suffix}"));
        if marker("failed") {
            DaemonStatus::Failed
        } else if marker("restart") || entries.contains(".restart") {
            DaemonStatus::Restarting
        } else if marker("start") {
            DaemonStatus::Starting
        } else if !pids.is_empty() {
            DaemonStatus::Failed
        } else {
            DaemonStatus::Stopped
        }
    }
}

impl ProcessStatusProvider for PidFileStatusSource {
    fn snapshot(&self) -> Result<Vec<DaemonState>, CoreError> {
        let entries = self.run_dir_entries()?;
        Ok(self
            .daemons
            .iter()
            .map(|daemon| DaemonState {
                name: daemon.clone(),
                status: self.status_of(daemon, &entries),
            })
            .collect())
    }
}

/// PIDs from `<daemon>-<pid>.pid` entries, sorted for deterministic probing.
fn pids_for(daemon: &DaemonName, entries: &HashSet<String>) -> Vec<String> {
    let prefix = format!("{daemon}-");
    let mut pids: Vec<String> = entries
        .iter()
        .filter_map(|name| name.strip_prefix(&prefix)?.strip_suffix(".pid"))
        .filter(|pid| !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_owned)
        .collect();
    pids.sort();
    pids
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
