//! Manager operations: status, configuration validation, restart, and the
//! file workflow, bound to one explicitly constructed context.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use nodewatch_core::{Config, DaemonState, PidFileStatusSource, ProcessStatusProvider};

use crate::error::ControlError;
use crate::files::{FileStore, UploadReceipt};
use crate::protocol::{ControlClient, ControlRequest, Operation};

pub const RESTART_CONFIRMATION: &str = "Restarting manager";

/// Which configuration the supervisor should check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    #[default]
    Manager,
    Agent,
    Remote,
}

impl FromStr for ConfigKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "agent" => Ok(Self::Agent),
            "remote" => Ok(Self::Remote),
            other => Err(format!(
                "unknown configuration type '{other}'; expected: manager, agent, remote"
            )),
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Manager => write!(f, "manager"),
            ConfigKind::Agent => write!(f, "agent"),
            ConfigKind::Remote => write!(f, "remote"),
        }
    }
}

/// Configuration to validate. Without a file the supervisor checks its
/// default file for `kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateTarget {
    #[serde(rename = "type")]
    pub kind: ConfigKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationReport {
    /// Error flag 0 is OK; anything else is KO with one detail per message line.
    pub fn from_flag(error: i32, message: &str) -> Self {
        if error == 0 {
            Self {
                status: ValidationStatus::Ok,
                details: vec![],
            }
        } else {
            Self {
                status: ValidationStatus::Ko,
                details: message.lines().map(str::to_string).collect(),
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }
}

/// Handle for one node's control surface. Built once from [`Config`] and
/// passed to whoever needs it.
pub struct Manager {
    client: ControlClient,
    status_source: Box<dyn ProcessStatusProvider>,
    files: FileStore,
}

impl Manager {
    pub fn new(
        client: ControlClient,
        status_source: Box<dyn ProcessStatusProvider>,
        files: FileStore,
    ) -> Self {
        Self {
            client,
            status_source,
            files,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ControlClient::from_config(config),
            Box::new(PidFileStatusSource::from_config(config)),
            FileStore::from_config(config),
        )
    }

    pub fn client(&self) -> &ControlClient {
        &self.client
    }

    /// Per-daemon state in configured daemon order.
    pub fn status(&self) -> Result<Vec<DaemonState>, ControlError> {
        Ok(self.status_source.snapshot()?)
    }

    pub fn validate(&self, target: &ValidateTarget) -> Result<ValidationReport, ControlError> {
        let request = ControlRequest::with_payload(
            Operation::Validate,
            json!({
                "component": "check_configuration",
                "data": target,
            }),
        );
        let response = self.client.send(&request)?;
        let report = ValidationReport::from_flag(response.error, &response.message);
        tracing::info!(kind = %target.kind, ok = report.is_ok(), "configuration validated");
        Ok(report)
    }

    /// Fails with [`ControlError::RestartUnavailable`] before any connection
    /// attempt when the control socket is absent.
    pub fn restart(&self) -> Result<String, ControlError> {
        if !self.client.socket_exists() {
            return Err(ControlError::RestartUnavailable {
                socket: self.client.socket().to_path_buf(),
            });
        }
        self.client
            .send(&ControlRequest::new(Operation::Restart))?
            .into_data()?;
        tracing::info!("restart requested");
        Ok(RESTART_CONFIRMATION.to_string())
    }

    pub fn upload(
        &self,
        name: &str,
        destination: &str,
        content_type: &str,
        overwrite: bool,
    ) -> Result<UploadReceipt, ControlError> {
        self.files.upload(name, destination, content_type, overwrite)
    }

    pub fn get_file(&self, path: &str) -> Result<Vec<u8>, ControlError> {
        self.files.get_file(path)
    }

    pub fn delete_file(&self, path: &str) -> Result<String, ControlError> {
        self.files.delete_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_ok_has_no_details() {
        let report = ValidationReport::from_flag(0, "");
        assert!(report.is_ok());
        assert_eq!(
            serde_json::to_value(&report).expect("encode"),
            json!({"status": "OK"})
        );
    }

    #[test]
    fn validation_ko_splits_lines() {
        let msg = "2019/02/27 11:30:24 ossec-authd: ERROR: (1230): Invalid element in the configuration: 'use_source_i'.\n\
                   2019/02/27 11:30:24 ossec-authd: ERROR: (1202): Configuration error at '/var/ossec/etc/ossec.conf'.";
        let report = ValidationReport::from_flag(1, msg);
        assert_eq!(report.status, ValidationStatus::Ko);
        assert_eq!(report.details.len(), 2);
        for (detail, line) in report.details.iter().zip(msg.split('\n')) {
            assert!(line.contains(detail.as_str()));
        }
    }

    #[test]
    fn validate_target_wire_shape() {
        let target = ValidateTarget {
            kind: ConfigKind::Remote,
            file: Some(PathBuf::from("/var/ossec/etc/shared/default/agent.conf")),
        };
        assert_eq!(
            serde_json::to_value(&target).expect("encode"),
            json!({"type": "remote", "file": "/var/ossec/etc/shared/default/agent.conf"})
        );
        assert_eq!(
            serde_json::to_value(ValidateTarget::default()).expect("encode"),
            json!({"type": "manager"})
        );
    }

    #[test]
    fn config_kind_parse() {
        assert_eq!("Agent".parse::<ConfigKind>(), Ok(ConfigKind::Agent));
        assert!("cluster".parse::<ConfigKind>().is_err());
    }
}
