//! Role-specific daemon manifests.
//!
//! # Storage layout
//!
//! ```text
//! <manifest_dir>/
//!   master_daemons_check.txt
//!   worker_daemons_check.txt
//! ```
//!
//! Each file holds one daemon per line in the supervisor's status format:
//!
//! ```text
//! wazuh-clusterd is running...
//! ossec-maild not running...
//! wazuh-apid is starting...
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};
use crate::paths;
use crate::types::{DaemonName, DaemonState, DaemonStatus, NodeRole};

/// Expected daemon states for one node role, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeManifest {
    role: NodeRole,
    entries: Vec<DaemonState>,
}

impl NodeManifest {
    /// Build a manifest from entries. Daemon names must be unique.
    pub fn new(role: NodeRole, entries: Vec<DaemonState>) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for (idx, entry) in entries.iter().enumerate() {
            if !seen.insert(&entry.name) {
                return Err(CoreError::ManifestParse {
                    path: PathBuf::from(role.manifest_file_name()),
                    line: idx + 1,
                    details: format!("duplicate daemon '{}'", entry.name),
                });
            }
        }
        Ok(Self { role, entries })
    }

    /// Parse manifest text. `path` is only used to annotate errors.
    pub fn parse(role: NodeRole, path: &Path, text: &str) -> Result<Self, CoreError> {
        let mut entries = Vec::new();
        let mut seen: HashSet<DaemonName> = HashSet::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let state = parse_status_line(line).map_err(|details| CoreError::ManifestParse {
                path: path.to_path_buf(),
                line: idx + 1,
                details,
            })?;
            if !seen.insert(state.name.clone()) {
                return Err(CoreError::ManifestParse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    details: format!("duplicate daemon '{}'", state.name),
                });
            }
            entries.push(state);
        }

        Ok(Self { role, entries })
    }

    /// Load `<manifest_dir>/<role>_daemons_check.txt`.
    ///
    /// Returns `CoreError::ManifestNotFound` if absent,
    /// `CoreError::ManifestParse` (with path + line) if malformed.
    pub fn load_at(manifest_dir: &Path, role: NodeRole) -> Result<Self, CoreError> {
        let path = paths::manifest_path(manifest_dir, role);
        if !path.exists() {
            return Err(CoreError::ManifestNotFound { path });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let manifest = Self::parse(role, &path, &contents)?;
        tracing::debug!(
            role = %role,
            path = %path.display(),
            daemons = manifest.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn entries(&self) -> &[DaemonState] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expected(&self, name: &DaemonName) -> Option<DaemonStatus> {
        self.entries
            .iter()
            .find(|entry| &entry.name == name)
            .map(|entry| entry.status)
    }
}

/// Parse one supervisor status line into a [`DaemonState`].
pub fn parse_status_line(line: &str) -> Result<DaemonState, String> {
    let trimmed = line.trim().trim_end_matches('.');
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.as_slice() {
        [name, "not", "running"] => Ok(DaemonState::new(*name, DaemonStatus::Stopped)),
        [name, "is", status] => {
            let status = status.parse::<DaemonStatus>()?;
            Ok(DaemonState::new(*name, status))
        }
        _ => Err(format!(
            "expected '<daemon> is <status>...' or '<daemon> not running...', got '{line}'"
        )),
    }
}

/// Render a [`DaemonState`] the way the supervisor prints it.
pub fn to_status_line(state: &DaemonState) -> String {
    match state.status {
        DaemonStatus::Stopped => format!("{} not running...", state.name),
        status => format!("{} is {}...", state.name, status),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ossec-monitord is running...", DaemonStatus::Running)]
    #[case("ossec-maild not running...", DaemonStatus::Stopped)]
    #[case("wazuh-apid is starting...", DaemonStatus::Starting)]
    #[case("wazuh-clusterd is restarting", DaemonStatus::Restarting)]
    #[case("  ossec-dbd is failed...  ", DaemonStatus::Failed)]
    fn status_line_forms(#[case] line: &str, #[case] status: DaemonStatus) {
        let state = parse_status_line(line).expect("parse");
        assert_eq!(state.status, status);
    }

    #[test]
    fn garbage_line_is_rejected() {
        assert!(parse_status_line("ossec-monitord").is_err());
        assert!(parse_status_line("ossec-monitord is sleeping...").is_err());
    }

    #[test]
    fn stopped_renders_as_not_running() {
        let state = DaemonState::new("ossec-maild", DaemonStatus::Stopped);
        assert_eq!(to_status_line(&state), "ossec-maild not running...");
        let state = DaemonState::new("ossec-maild", DaemonStatus::Running);
        assert_eq!(to_status_line(&state), "ossec-maild is running...");
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# reference\n\nossec-monitord is running...\nossec-maild not running...\n";
        let manifest = NodeManifest::parse(NodeRole::Master, Path::new("m.txt"), text).expect("parse");
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.expected(&DaemonName::from("ossec-maild")),
            Some(DaemonStatus::Stopped)
        );
    }

    #[test]
    fn duplicate_daemon_reports_line_number() {
        let text = "ossec-monitord is running...\nossec-monitord not running...\n";
        let err = NodeManifest::parse(NodeRole::Worker, Path::new("w.txt"), text).unwrap_err();
        match err {
            CoreError::ManifestParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn new_rejects_duplicates() {
        let entries = vec![
            DaemonState::new("a", DaemonStatus::Running),
            DaemonState::new("a", DaemonStatus::Stopped),
        ];
        assert!(NodeManifest::new(NodeRole::Master, entries).is_err());
    }
}
