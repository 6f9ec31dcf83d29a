use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use nodewatch_core::CoreError;

/// Error surface for the control channel and file operations.
///
/// Every variant maps to a stable numeric code via [`ControlError::code`] so
/// callers can translate failures without matching on message text.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("[1901] restart channel unavailable (socket missing: {socket})")]
    RestartUnavailable { socket: PathBuf },

    #[error("[1902] cannot reach control socket {socket}: {source}")]
    Connection {
        socket: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[1903] no response from {socket} within {timeout:?}")]
    Timeout { socket: PathBuf, timeout: Duration },

    #[error("[1904] control protocol error: {0}")]
    Protocol(String),

    #[error("[1905] file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("[1906] file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("[1907] file could not be deleted: {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[1908] validation failed for {path}: {}", .details.join("; "))]
    Validation { path: PathBuf, details: Vec<String> },

    #[error("[1909] content of {path} is empty")]
    EmptyContent { path: PathBuf },

    #[error("[1910] unsupported content type '{0}'")]
    UnsupportedContentType(String),

    #[error("[1913] I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[1914] path '{path}' is outside the install root")]
    InvalidPath { path: PathBuf },

    #[error("[{code}] control daemon error: {message}")]
    Remote { code: i32, message: String },

    #[error("[1000] {0}")]
    Core(#[from] CoreError),
}

impl ControlError {
    /// Stable numeric code for caller-side mapping.
    pub fn code(&self) -> i32 {
        match self {
            Self::RestartUnavailable { .. } => 1901,
            Self::Connection { .. } => 1902,
            Self::Timeout { .. } => 1903,
            Self::Protocol(_) => 1904,
            Self::AlreadyExists { .. } => 1905,
            Self::NotFound { .. } => 1906,
            Self::DeleteFailed { .. } => 1907,
            Self::Validation { .. } => 1908,
            Self::EmptyContent { .. } => 1909,
            Self::UnsupportedContentType(_) => 1910,
            Self::Io { .. } => 1913,
            Self::InvalidPath { .. } => 1914,
            Self::Remote { code, .. } => *code,
            Self::Core(_) => 1000,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ControlError {
    ControlError::Io {
        path: path.into(),
        source,
    }
}
