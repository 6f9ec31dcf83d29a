//! nodewatch core library: domain types, configuration, manifests, daemon status.
//!
//! - [`types`]: daemon, role and verdict types
//! - [`error`]: [`CoreError`]
//! - [`config`]: [`Config`] loading and path resolution
//! - [`manifest`]: role-specific [`NodeManifest`] reference files
//! - [`process`]: the [`ProcessStatusProvider`] capability and its PID-file source

pub mod config;
pub mod error;
pub mod manifest;
pub mod paths;
pub mod process;
pub mod types;

pub use config::Config;
pub use error::CoreError;
pub use manifest::NodeManifest;
pub use process::{PidFileStatusSource, ProcessStatusProvider};
pub use types::{DaemonName, DaemonState, DaemonStatus, HealthVerdict, NodeRole};
