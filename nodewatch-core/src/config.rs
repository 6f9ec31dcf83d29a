//! Node configuration.
//!
//! # Lookup order
//!
//! 1. An explicit path (the CLI `--config` flag).
//! 2. `$NODEWATCH_CONFIG`.
//! 3. Built-in defaults (a stock `/var/ossec` install).
//!
//! Every field is optional in the YAML file; missing fields take their
//! default. Relative paths are resolved against `install_root`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::paths;
use crate::types::{DaemonName, NodeRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the manager installation.
    pub install_root: PathBuf,
    /// Directory holding `master_daemons_check.txt` / `worker_daemons_check.txt`.
    pub manifest_dir: PathBuf,
    /// Log scanned for the readiness marker.
    pub api_log: PathBuf,
    pub readiness_marker: String,
    /// How much of the end of `api_log` is scanned.
    pub log_tail_bytes: u64,
    /// Host name that identifies the master node.
    pub master_hostname: String,
    pub control_socket: PathBuf,
    /// Applies to every socket read and write.
    pub timeout_ms: u64,
    pub daemons: Vec<DaemonName>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from(paths::DEFAULT_INSTALL_ROOT),
            manifest_dir: PathBuf::from(paths::DEFAULT_MANIFEST_DIR),
            api_log: PathBuf::from(paths::API_LOG),
            readiness_marker: paths::DEFAULT_READINESS_MARKER.to_string(),
            log_tail_bytes: paths::DEFAULT_LOG_TAIL_BYTES,
            master_hostname: paths::DEFAULT_MASTER_HOSTNAME.to_string(),
            control_socket: PathBuf::from(paths::CONTROL_SOCKET),
            timeout_ms: paths::DEFAULT_TIMEOUT.as_millis() as u64,
            daemons: paths::DEFAULT_DAEMONS
                .iter()
                .map(|name| DaemonName::from(*name))
                .collect(),
        }
    }
}

impl Config {
    /// Load a config file. A missing file is an error here; use [`Config::load`]
    /// for the defaulting lookup.
    pub fn load_at(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            return Self::load_at(path);
        }
        match std::env::var_os(paths::CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load_at(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn api_log_path(&self) -> PathBuf {
        paths::resolve(&self.install_root, &self.api_log)
    }

    pub fn control_socket_path(&self) -> PathBuf {
        paths::resolve(&self.install_root, &self.control_socket)
    }

    pub fn run_dir(&self) -> PathBuf {
        paths::run_dir(&self.install_root)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        paths::tmp_dir(&self.install_root)
    }

    pub fn manifest_dir_path(&self) -> PathBuf {
        paths::resolve(&self.install_root, &self.manifest_dir)
    }

    pub fn manifest_path(&self, role: NodeRole) -> PathBuf {
        paths::manifest_path(&self.manifest_dir_path(), role)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
