//! Control socket client.
//!
//! One newline-terminated JSON request, one newline-terminated JSON response,
//! then the connection is dropped. The whole response must arrive within the
//! client timeout and fit in [`MAX_RESPONSE_BYTES`].

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nodewatch_core::{Config, DaemonState};

use crate::error::ControlError;

/// Longest response line accepted, newline included.
pub const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Status,
    Validate,
    Restart,
    Upload,
    GetFile,
    DeleteFile,
}

/// JSON newline-delimited request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl ControlRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            payload: Value::Null,
        }
    }

    pub fn with_payload(operation: Operation, payload: Value) -> Self {
        Self { operation, payload }
    }
}

/// JSON newline-delimited response. `error == 0` means success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub error: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ControlResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            error: 0,
            message: String::new(),
            data,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            error: code,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// Payload of a successful response; a non-zero error becomes
    /// [`ControlError::Remote`].
    pub fn into_data(self) -> Result<Value, ControlError> {
        if self.error == 0 {
            Ok(self.data)
        } else {
            Err(ControlError::Remote {
                code: self.error,
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlClient {
    socket: PathBuf,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(socket: PathBuf, timeout: Duration) -> Self {
        // The socket API rejects a zero timeout.
        let timeout = timeout.max(Duration::from_millis(1));
        Self { socket, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.control_socket_path(), config.timeout())
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn socket_exists(&self) -> bool {
        self.socket.exists()
    }

    /// Send one request and return one response.
    pub fn send(&self, request: &ControlRequest) -> Result<ControlResponse, ControlError> {
        let deadline = Instant::now() + self.timeout;
        let stream = UnixStream::connect(&self.socket).map_err(|e| self.connection_err(e))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| self.connection_err(e))?;

        let mut payload = serde_json::to_vec(request)
            .map_err(|e| ControlError::Protocol(format!("cannot encode request: {e}")))?;
        payload.push(b'\n');

        let mut writer = &stream;
        writer
            .write_all(&payload)
            .and_then(|()| writer.flush())
            .map_err(|e| self.transfer_err(e))?;
        tracing::debug!(socket = %self.socket.display(), operation = ?request.operation, "request sent");

        let line = self.read_response_line(&stream, deadline)?;
        if line.trim().is_empty() {
            return Err(ControlError::Protocol(
                "control daemon closed connection before responding".to_string(),
            ));
        }

        let response: ControlResponse = serde_json::from_str(line.trim_end())
            .map_err(|e| ControlError::Protocol(format!("malformed response: {e}")))?;
        tracing::debug!(error = response.error, "response received");
        Ok(response)
    }

    /// Read up to the first newline. Each read waits only for what is left of
    /// `deadline`, so a peer trickling bytes cannot stretch the exchange.
    fn read_response_line(
        &self,
        stream: &UnixStream,
        deadline: Instant,
    ) -> Result<String, ControlError> {
        let mut reader = BufReader::new(stream).take(MAX_RESPONSE_BYTES);
        let mut line = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_err());
            }
            stream
                .set_read_timeout(Some(remaining))
                .map_err(|e| self.connection_err(e))?;

            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.transfer_err(e)),
            };
            if available.is_empty() {
                if reader.limit() == 0 {
                    return Err(ControlError::Protocol(format!(
                        "response exceeds {MAX_RESPONSE_BYTES} bytes without a newline"
                    )));
                }
                break;
            }

            let (consumed, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    line.extend_from_slice(&available[..=end]);
                    (end + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            };
            reader.consume(consumed);
            if complete {
                break;
            }
        }

        String::from_utf8(line)
            .map_err(|e| ControlError::Protocol(format!("response is not UTF-8: {e}")))
    }

    /// Ask the supervisor for its own view of daemon states.
    pub fn request_status(&self) -> Result<Vec<DaemonState>, ControlError> {
        let data = self.send(&ControlRequest::new(Operation::Status))?.into_data()?;
        serde_json::from_value(data)
            .map_err(|e| ControlError::Protocol(format!("malformed daemon list: {e}")))
    }

    fn connection_err(&self, source: std::io::Error) -> ControlError {
        ControlError::Connection {
            socket: self.socket.clone(),
            source,
        }
    }

    fn timeout_err(&self) -> ControlError {
        ControlError::Timeout {
            socket: self.socket.clone(),
            timeout: self.timeout,
        }
    }

    fn transfer_err(&self, source: std::io::Error) -> ControlError {
        match source.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => self.timeout_err(),
            _ => self.connection_err(source),
        }
    }
}
