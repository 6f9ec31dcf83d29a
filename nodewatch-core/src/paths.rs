use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::NodeRole;

pub const DEFAULT_INSTALL_ROOT: &str = "/var/ossec";
pub const DEFAULT_MANIFEST_DIR: &str = "/configuration_files/healthcheck";
pub const DEFAULT_MASTER_HOSTNAME: &str = "wazuh-master";
pub const DEFAULT_READINESS_MARKER: &str = "Listening on ";
pub const DEFAULT_LOG_TAIL_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const CONFIG_ENV: &str = "NODEWATCH_CONFIG";
pub const CONTROL_SOCKET: &str = "queue/sockets/control";
pub const API_LOG: &str = "logs/api.log";

/// Daemons reported by the supervisor, in its reporting order.
pub const DEFAULT_DAEMONS: &[&str] = &[
    "ossec-agentlessd",
    "ossec-analysisd",
    "ossec-authd",
    "ossec-csyslogd",
    "ossec-dbd",
    "ossec-monitord",
    "ossec-execd",
    "wazuh-modulesd",
    "ossec-maild",
    "ossec-remoted",
    "ossec-logcollector",
    "ossec-reportd",
    "ossec-syscheckd",
    "wazuh-clusterd",
    "wazuh-apid",
];

pub fn run_dir(root: &Path) -> PathBuf {
    root.join("var").join("run")
}

/// Staging area for uploads.
pub fn tmp_dir(root: &Path) -> PathBuf {
    root.join("tmp").join("api")
}

pub fn proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

pub fn manifest_path(manifest_dir: &Path, role: NodeRole) -> PathBuf {
    manifest_dir.join(role.manifest_file_name())
}

/// Relative paths are taken relative to `root`; absolute paths pass through.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
