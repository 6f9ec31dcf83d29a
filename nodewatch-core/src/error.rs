//! Error types for nodewatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration, manifests, and status probing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on config load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A manifest line could not be understood.
    #[error("failed to parse manifest {path} line {line}: {details}")]
    ManifestParse {
        path: PathBuf,
        line: usize,
        details: String,
    },

    /// The manifest reference file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// Process state could not be read.
    #[error("cannot read process state: {0}")]
    Probe(String),
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
