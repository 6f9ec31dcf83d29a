//! Control channel behaviour against a fake supervisor listening on a Unix
//! socket in a temp dir. Each fake serves exactly one connection.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nodewatch_control::protocol::MAX_RESPONSE_BYTES;
use nodewatch_control::{
    ConfigKind, ControlClient, ControlError, ControlRequest, FileStore, Manager, Operation,
    RulesetValidator, ValidateTarget, ValidationStatus, RESTART_CONFIRMATION,
};
use nodewatch_core::{DaemonName, DaemonStatus, PidFileStatusSource};
use serde_json::{json, Value};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_millis(500);

/// Serve one connection: read one request line, hand it to `reply`, write
/// whatever it returns. Returns the request seen.
fn serve_once<F>(socket: &Path, reply: F) -> JoinHandle<Option<Value>>
where
    F: FnOnce(&Value) -> Option<String> + Send + 'static,
{
    let listener = UnixListener::bind(socket).expect("bind fake supervisor");
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(&stream);
        let mut line = String::new();
        reader.read_line(&mut line).expect("read request");
        let request: Value = serde_json::from_str(line.trim_end()).expect("request json");
        match reply(&request) {
            Some(body) => {
                let mut writer = &stream;
                writer.write_all(body.as_bytes()).expect("write response");
                writer.write_all(b"\n").expect("newline");
            }
            None => thread::sleep(TIMEOUT * 3),
        }
        Some(request)
    })
}

/// Serve one connection by writing `body` in `chunk`-sized pieces with
/// `pause` between them. Write errors end the stream quietly: the client is
/// expected to hang up early.
fn serve_in_chunks(socket: &Path, body: Vec<u8>, chunk: usize, pause: Duration) -> JoinHandle<()> {
    let listener = UnixListener::bind(socket).expect("bind fake supervisor");
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut line = String::new();
        BufReader::new(&stream)
            .read_line(&mut line)
            .expect("read request");
        let mut writer = &stream;
        for piece in body.chunks(chunk) {
            if writer.write_all(piece).is_err() {
                return;
            }
            thread::sleep(pause);
        }
    })
}

fn socket_path(dir: &TempDir) -> PathBuf {
    dir.path().join("control")
}

fn manager(dir: &TempDir) -> Manager {
    Manager::new(
        ControlClient::new(socket_path(dir), TIMEOUT),
        Box::new(PidFileStatusSource::new(
            dir.path().join("var/run"),
            dir.path().join("proc"),
            vec![DaemonName::from("ossec-monitord")],
        )),
        FileStore::new(
            dir.path().to_path_buf(),
            dir.path().join("tmp"),
            Box::new(RulesetValidator),
        ),
    )
}

// ---------------------------------------------------------------------------
// 1. validate
// ---------------------------------------------------------------------------

#[test]
fn validate_ok_when_error_flag_is_zero() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| {
        Some(json!({"error": 0, "message": ""}).to_string())
    });

    let report = manager(&dir)
        .validate(&ValidateTarget::default())
        .expect("validate");
    assert_eq!(report.status, ValidationStatus::Ok);
    assert!(report.details.is_empty());

    let request = server.join().expect("server").expect("request");
    assert_eq!(request["operation"], "validate");
    assert_eq!(request["payload"]["component"], "check_configuration");
    assert_eq!(request["payload"]["data"]["type"], "manager");
}

#[test]
fn validate_ko_splits_cluster_error() {
    let dir = TempDir::new().expect("tempdir");
    let message = "2019/02/27 11:30:07 wazuh-clusterd: ERROR: [Cluster] [Main] Error 3004 - \
                   Error in cluster configuration: Unspecified key";
    let server = serve_once(&socket_path(&dir), move |_| {
        Some(json!({"error": 1, "message": message}).to_string())
    });

    let target = ValidateTarget {
        kind: ConfigKind::Agent,
        file: None,
    };
    let report = manager(&dir).validate(&target).expect("validate");
    assert_eq!(report.status, ValidationStatus::Ko);
    assert_eq!(report.details, vec![message.to_string()]);

    let request = server.join().expect("server").expect("request");
    assert_eq!(request["payload"]["data"]["type"], "agent");
}

// ---------------------------------------------------------------------------
// 2. restart
// ---------------------------------------------------------------------------

#[test]
fn restart_returns_confirmation() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |request| {
        assert_eq!(request["operation"], "restart");
        Some(json!({"error": 0, "message": "ok"}).to_string())
    });

    assert_eq!(manager(&dir).restart().expect("restart"), RESTART_CONFIRMATION);
    server.join().expect("server");
}

#[test]
fn restart_without_socket_fails_before_connecting() {
    let dir = TempDir::new().expect("tempdir");
    let err = manager(&dir).restart().unwrap_err();
    assert!(matches!(err, ControlError::RestartUnavailable { .. }), "got: {err}");
    assert_eq!(err.code(), 1901);
}

#[test]
fn restart_refused_by_supervisor_surfaces_remote_code() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| {
        Some(json!({"error": 1017, "message": "restart in progress"}).to_string())
    });

    let err = manager(&dir).restart().unwrap_err();
    assert!(matches!(err, ControlError::Remote { code: 1017, .. }), "got: {err}");
    server.join().expect("server");
}

// ---------------------------------------------------------------------------
// 3. send failure modes
// ---------------------------------------------------------------------------

#[test]
fn silent_supervisor_times_out() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| None);

    let client = ControlClient::new(socket_path(&dir), Duration::from_millis(100));
    let err = client
        .send(&ControlRequest::new(Operation::Status))
        .unwrap_err();
    assert!(matches!(err, ControlError::Timeout { .. }), "got: {err}");
    assert_eq!(err.code(), 1903);
    server.join().expect("server");
}

#[test]
fn garbage_response_is_protocol_error() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| Some("this is not json".to_string()));

    let client = ControlClient::new(socket_path(&dir), TIMEOUT);
    let err = client
        .send(&ControlRequest::new(Operation::Status))
        .unwrap_err();
    assert_eq!(err.code(), 1904);
    server.join().expect("server");
}

#[test]
fn blank_response_line_is_protocol_error() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| Some(String::new()));

    let client = ControlClient::new(socket_path(&dir), TIMEOUT);
    let err = client
        .send(&ControlRequest::new(Operation::Status))
        .unwrap_err();
    assert!(matches!(err, ControlError::Protocol(_)), "got: {err}");
    server.join().expect("server");
}

#[test]
fn trickling_supervisor_times_out_within_budget() {
    let dir = TempDir::new().expect("tempdir");
    let body = b"{\"error\":0,\"message\":\"slow\"}\n".to_vec();
    let server = serve_in_chunks(&socket_path(&dir), body, 1, Duration::from_millis(100));

    let timeout = Duration::from_millis(300);
    let client = ControlClient::new(socket_path(&dir), timeout);
    let started = Instant::now();
    let err = client
        .send(&ControlRequest::new(Operation::Status))
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ControlError::Timeout { .. }), "got: {err}");
    assert!(elapsed < timeout * 3, "send took {elapsed:?}");
    drop(client);
    server.join().expect("server");
}

#[test]
fn response_without_newline_is_capped() {
    let dir = TempDir::new().expect("tempdir");
    let body = vec![b'x'; MAX_RESPONSE_BYTES as usize + 4096];
    let server = serve_in_chunks(&socket_path(&dir), body, 64 * 1024, Duration::ZERO);

    let client = ControlClient::new(socket_path(&dir), Duration::from_secs(5));
    let err = client
        .send(&ControlRequest::new(Operation::Status))
        .unwrap_err();
    assert!(matches!(err, ControlError::Protocol(_)), "got: {err}");
    assert_eq!(err.code(), 1904);
    server.join().expect("server");
}

#[test]
fn remote_status_parses_daemon_list() {
    let dir = TempDir::new().expect("tempdir");
    let server = serve_once(&socket_path(&dir), |_| {
        Some(
            json!({
                "error": 0,
                "message": "",
                "data": [
                    {"name": "ossec-monitord", "status": "running"},
                    {"name": "wazuh-clusterd", "status": "restarting"}
                ]
            })
            .to_string(),
        )
    });

    let client = ControlClient::new(socket_path(&dir), TIMEOUT);
    let daemons = client.request_status().expect("status");
    assert_eq!(daemons.len(), 2);
    assert_eq!(daemons[1].status, DaemonStatus::Restarting);
    server.join().expect("server");
}

// ---------------------------------------------------------------------------
// 4. local status and files through the same handle
// ---------------------------------------------------------------------------

#[test]
fn status_reads_pid_files_without_socket() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("var/run")).expect("run dir");
    std::fs::create_dir_all(dir.path().join("proc/0234")).expect("proc");
    std::fs::write(dir.path().join("var/run/ossec-monitord-0234.pid"), b"").expect("pid");

    let status = manager(&dir).status().expect("status");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].status, DaemonStatus::Running);
}

#[test]
fn upload_get_delete_cycle() {
    let dir = TempDir::new().expect("tempdir");
    let lists = "audit-wazuh:write\naudit-wazuh-r:read\n";
    std::fs::write(dir.path().join("test_lists"), lists).expect("write");
    let manager = manager(&dir);

    manager
        .upload("test_lists", "etc/lists/uploaded_test_lists", "application/octet-stream", false)
        .expect("upload");
    assert_eq!(
        manager.get_file("etc/lists/uploaded_test_lists").expect("get"),
        lists.as_bytes()
    );
    manager
        .delete_file("etc/lists/uploaded_test_lists")
        .expect("delete");
    assert_eq!(
        manager.get_file("etc/lists/uploaded_test_lists").unwrap_err().code(),
        1906
    );
}
