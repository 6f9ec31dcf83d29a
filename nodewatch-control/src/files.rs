//! Staged file upload, retrieval, and deletion under the install root.
//!
//! ## `upload` protocol
//!
//! 1. Resolve source and destination under the install root.
//! 2. Read the source artifact.
//! 3. Write it to a fresh `api_tmp_file_<secs>_<rand>.<ext>` in the tmp dir.
//! 4. Validate the content.
//! 5. Failure: remove the temp file, destination untouched.
//! 6. Success: `chmod 0660`, rename temp → destination (atomic on POSIX),
//!    then remove the source artifact. A failed removal is only logged.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use nodewatch_core::Config;

use crate::error::{io_err, ControlError};
use crate::validator::{ContentType, ContentValidator, RulesetValidator};

const TEMP_PREFIX: &str = "api_tmp_file";
const TEMP_ATTEMPTS: usize = 8;

/// A temp file waiting to be promoted or discarded.
#[derive(Debug)]
pub struct StagedFile {
    pub temp_path: PathBuf,
    pub final_path: PathBuf,
    pub content_type: ContentType,
}

impl StagedFile {
    fn commit(self) -> Result<PathBuf, ControlError> {
        if let Err(e) = set_file_permissions(&self.temp_path) {
            self.rollback();
            return Err(e);
        }
        if let Some(parent) = self.final_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                self.rollback();
                return Err(io_err(parent, e));
            }
        }
        if let Err(e) = fs::rename(&self.temp_path, &self.final_path) {
            self.rollback();
            return Err(io_err(&self.final_path, e));
        }
        Ok(self.final_path)
    }

    fn rollback(&self) {
        if let Err(err) = fs::remove_file(&self.temp_path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.temp_path.display(), error = %err, "temp file left behind");
            }
        }
    }
}

/// Confirmation for a committed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

pub struct FileStore {
    root: PathBuf,
    tmp_dir: PathBuf,
    validator: Box<dyn ContentValidator>,
}

impl FileStore {
    pub fn new(root: PathBuf, tmp_dir: PathBuf, validator: Box<dyn ContentValidator>) -> Self {
        Self {
            root,
            tmp_dir,
            validator,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.install_root.clone(),
            config.tmp_dir(),
            Box::new(RulesetValidator),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate `name` and promote it to `destination`. Both are relative to
    /// the install root. An existing destination is only replaced with
    /// `overwrite`.
    ///
    /// Once the destination is in place the upload has succeeded; failing to
    /// remove the source afterwards is logged, not returned.
    pub fn upload(
        &self,
        name: &str,
        destination: &str,
        content_type: &str,
        overwrite: bool,
    ) -> Result<UploadReceipt, ControlError> {
        let content_type: ContentType = content_type.parse()?;
        let source = self.resolve(name)?;
        let final_path = self.resolve(destination)?;

        if !source.is_file() {
            return Err(ControlError::NotFound { path: source });
        }
        if !overwrite && final_path != source && final_path.exists() {
            return Err(ControlError::AlreadyExists { path: final_path });
        }

        let content = fs::read(&source).map_err(|e| io_err(&source, e))?;
        if content.is_empty() {
            return Err(ControlError::EmptyContent { path: source });
        }

        let staged = self.stage(content_type, final_path, &content)?;
        tracing::debug!(temp = %staged.temp_path.display(), "staged upload");

        if let Err(details) = self.validator.validate(content_type, &content) {
            staged.rollback();
            tracing::warn!(destination, problems = details.len(), "upload rejected");
            return Err(ControlError::Validation {
                path: PathBuf::from(destination),
                details,
            });
        }

        let path = staged.commit()?;
        if path != source {
            if let Err(err) = fs::remove_file(&source) {
                tracing::warn!(source = %source.display(), error = %err, "uploaded source left behind");
            }
        }

        tracing::info!(path = %path.display(), bytes = content.len(), "upload committed");
        Ok(UploadReceipt {
            path,
            bytes: content.len() as u64,
            sha256: hex::encode(Sha256::digest(&content)),
        })
    }

    pub fn get_file(&self, path: &str) -> Result<Vec<u8>, ControlError> {
        let full = self.resolve(path)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ControlError::NotFound { path: full }),
            Err(e) => Err(io_err(full, e)),
        }
    }

    pub fn delete_file(&self, path: &str) -> Result<String, ControlError> {
        let full = self.resolve(path)?;
        if !full.exists() {
            return Err(ControlError::NotFound { path: full });
        }
        fs::remove_file(&full).map_err(|source| ControlError::DeleteFailed {
            path: full.clone(),
            source,
        })?;
        tracing::info!(path = %full.display(), "file deleted");
        Ok(format!("File was deleted: {path}"))
    }

    /// Join `relative` onto the root, refusing absolute paths and `..`.
    fn resolve(&self, relative: &str) -> Result<PathBuf, ControlError> {
        let candidate = Path::new(relative);
        let escapes = relative.is_empty()
            || candidate.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
        if escapes {
            return Err(ControlError::InvalidPath {
                path: candidate.to_path_buf(),
            });
        }
        Ok(self.root.join(candidate))
    }

    /// Write `content` to a temp path no concurrent upload can share.
    fn stage(
        &self,
        content_type: ContentType,
        final_path: PathBuf,
        content: &[u8],
    ) -> Result<StagedFile, ControlError> {
        fs::create_dir_all(&self.tmp_dir).map_err(|e| io_err(&self.tmp_dir, e))?;

        for _ in 0..TEMP_ATTEMPTS {
            let temp_path = self.tmp_dir.join(temp_file_name(content_type));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(io_err(temp_path, e)),
            };
            let staged = StagedFile {
                temp_path,
                final_path,
                content_type,
            };
            if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
                staged.rollback();
                return Err(io_err(&staged.temp_path, e));
            }
            return Ok(staged);
        }

        Err(io_err(
            &self.tmp_dir,
            std::io::Error::new(ErrorKind::AlreadyExists, "no free temp file name"),
        ))
    }
}

fn temp_file_name(content_type: ContentType) -> String {
    format!(
        "{TEMP_PREFIX}_{}_{}.{}",
        Utc::now().timestamp(),
        rand::random::<u32>(),
        content_type.extension()
    )
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ControlError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o660)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ControlError> {
    Ok(())
}
