//! Domain types for node health probing.
//!
//! All types are serializable via serde; none of them are persisted except the
//! manifests, which are read-only reference files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a supervised daemon (e.g. `ossec-monitord`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaemonName(pub String);

impl fmt::Display for DaemonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DaemonName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DaemonName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle state of a daemon as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonStatus {
    Running,
    Stopped,
    Failed,
    Starting,
    Restarting,
}

impl DaemonStatus {
    pub const ALL: [DaemonStatus; 5] = [
        DaemonStatus::Running,
        DaemonStatus::Stopped,
        DaemonStatus::Failed,
        DaemonStatus::Starting,
        DaemonStatus::Restarting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DaemonStatus::Running => "running",
            DaemonStatus::Stopped => "stopped",
            DaemonStatus::Failed => "failed",
            DaemonStatus::Starting => "starting",
            DaemonStatus::Restarting => "restarting",
        }
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DaemonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            "starting" => Ok(Self::Starting),
            "restarting" => Ok(Self::Restarting),
            other => Err(format!(
                "unknown daemon status '{other}'; expected: running, stopped, failed, starting, restarting"
            )),
        }
    }
}

/// Cluster role of a node. Each role expects a different daemon manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Master,
    Worker,
}

impl NodeRole {
    /// A host named exactly `master_hostname` is the master; every other host is
    /// a worker.
    pub fn from_hostname(hostname: &str, master_hostname: &str) -> Self {
        if hostname == master_hostname {
            NodeRole::Master
        } else {
            NodeRole::Worker
        }
    }

    /// File name of the reference manifest for this role.
    pub fn manifest_file_name(self) -> &'static str {
        match self {
            NodeRole::Master => "master_daemons_check.txt",
            NodeRole::Worker => "worker_daemons_check.txt",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Master => write!(f, "master"),
            NodeRole::Worker => write!(f, "worker"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One daemon's observed (or expected) state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaemonState {
    pub name: DaemonName,
    pub status: DaemonStatus,
}

impl DaemonState {
    pub fn new(name: impl Into<DaemonName>, status: DaemonStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Outcome of one health evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthVerdict {
    pub passed: bool,
    pub reasons: Vec<String>,
}

impl HealthVerdict {
    pub fn healthy() -> Self {
        Self {
            passed: true,
            reasons: vec![],
        }
    }

    pub fn unhealthy(reasons: Vec<String>) -> Self {
        Self {
            passed: false,
            reasons,
        }
    }

    /// Orchestrator probe convention: 0 is healthy, 1 is unhealthy.
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
