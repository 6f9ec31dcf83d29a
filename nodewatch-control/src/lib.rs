//! Control surface of a manager node: socket client, status/validate/restart
//! operations, and the staged file workflow.

mod error;
pub mod files;
pub mod manager;
pub mod protocol;
pub mod validator;

pub use error::ControlError;
pub use files::{FileStore, StagedFile, UploadReceipt};
pub use manager::{
    ConfigKind, Manager, ValidateTarget, ValidationReport, ValidationStatus, RESTART_CONFIRMATION,
};
pub use protocol::{ControlClient, ControlRequest, ControlResponse, Operation};
pub use validator::{ContentType, ContentValidator, RulesetValidator};
