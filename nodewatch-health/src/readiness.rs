//! Log readiness probe.
//!
//! A node's API is considered ready once its log contains the readiness
//! marker. Only the last `tail_bytes` of the log are scanned. The probe is
//! fail-closed: an absent or unreadable log is "not ready", never an error.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use nodewatch_core::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogReadinessProbe {
    marker: String,
    tail_bytes: u64,
}

impl LogReadinessProbe {
    pub fn new(marker: impl Into<String>, tail_bytes: u64) -> Self {
        Self {
            marker: marker.into(),
            tail_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.readiness_marker.clone(), config.log_tail_bytes)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// `true` when the marker appears in the tail of the log at `path`.
    pub fn ready(&self, path: &Path) -> bool {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "log not readable");
                return false;
            }
        };
        match self.ready_in(file) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "log read failed");
                false
            }
        }
    }

    /// Scan the tail of any seekable reader.
    pub fn ready_in<R: Read + Seek>(&self, mut reader: R) -> io::Result<bool> {
        let len = reader.seek(SeekFrom::End(0))?;
        let start = len.saturating_sub(self.tail_bytes);
        reader.seek(SeekFrom::Start(start))?;

        let mut tail = Vec::with_capacity((len - start) as usize);
        reader.take(self.tail_bytes).read_to_end(&mut tail)?;
        Ok(contains(&tail, self.marker.as_bytes()))
    }
}

/// An empty marker matches any readable log.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
