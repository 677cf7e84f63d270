//! Tally daemon entrypoint.
//!
//! A small, single-writer service that owns the rolling activity
//! summary: a unix socket listener, strict request validation, and a
//! JSON storage slot behind the aggregation engine. The event collector
//! pushes `seen`/`idle` events in; presentation clients pull read-only
//! snapshots out.

use fs_err as fs;
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tally_core::{EngineConfig, StorageConfig};
use tally_daemon_protocol::{
    parse_event, ErrorInfo, Method, Request, Response, MAX_REQUEST_BYTES, PROTOCOL_VERSION,
};

mod state;

use state::SharedState;

const READ_TIMEOUT_SECS: u64 = 2;
const READ_CHUNK_SIZE: usize = 4096;
/// Matches the original tracker's refresh interval: prune and re-store
/// once a minute so stale tracks expire without new observations.
const MAINTENANCE_INTERVAL_SECS: u64 = 60;

fn main() {
    init_logging();

    let storage = StorageConfig::default();
    if let Err(err) = storage.ensure_dirs() {
        error!(error = %err, "Failed to create tally data directory");
        std::process::exit(1);
    }

    let socket_path = storage.socket_file();
    if let Err(err) = remove_existing_socket(&socket_path) {
        error!(error = %err, path = %socket_path.display(), "Failed to remove existing socket");
        std::process::exit(1);
    }

    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = %socket_path.display(), "Failed to bind daemon socket");
            std::process::exit(1);
        }
    };

    let shared_state = Arc::new(SharedState::new(&storage, EngineConfig::default()));
    info!(
        path = %socket_path.display(),
        tracks = shared_state.track_count(),
        "Tally daemon started"
    );

    spawn_maintenance_sweep(Arc::clone(&shared_state));

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&shared_state);
                thread::spawn(|| handle_connection(stream, state));
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept daemon connection");
            }
        }
    }
}

fn spawn_maintenance_sweep(state: Arc<SharedState>) {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(MAINTENANCE_INTERVAL_SECS));
        state.maintain();
    });
}

fn init_logging() {
    let debug_enabled = env::var("TALLY_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn remove_existing_socket(socket_path: &Path) -> Result<(), String> {
    if socket_path.exists() {
        fs::remove_file(socket_path)
            .map_err(|err| format!("Failed to remove existing socket: {}", err))?;
    }
    Ok(())
}

fn handle_connection(mut stream: UnixStream, state: Arc<SharedState>) {
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            warn!(code = %err.code, message = %err.message, "Failed to read request");
            let response = Response::error_with_info(None, err);
            let _ = write_response(&mut stream, response);
            return;
        }
    };

    tracing::debug!(method = ?request.method, id = ?request.id, "Daemon request received");
    let response = handle_request(request, state);
    let _ = write_response(&mut stream, response);
}

/// Reads one newline-delimited request line from the socket.
///
/// Tally requests are small (an event envelope tops out well under the
/// cap), so anything past `MAX_REQUEST_BYTES` is a misbehaving client
/// and the connection is refused rather than buffered.
fn read_request(stream: &mut UnixStream) -> Result<Request, ErrorInfo> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(READ_TIMEOUT_SECS)));

    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err(ErrorInfo::new(
                        "request_too_large",
                        format!("request line exceeded the {} byte cap", MAX_REQUEST_BYTES),
                    ));
                }
                if chunk[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(ErrorInfo::new(
                    "read_timeout",
                    "no complete request line before the read timeout",
                ));
            }
            Err(err) => {
                return Err(ErrorInfo::new(
                    "read_error",
                    format!("socket read failed: {}", err),
                ));
            }
        }
    }

    if buffer.is_empty() {
        return Err(ErrorInfo::new("empty_request", "no request line received"));
    }

    let line = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => {
            let trailing = &buffer[index + 1..];
            if trailing.iter().any(|b| !b.is_ascii_whitespace()) {
                warn!("Ignoring bytes after the request line");
            }
            &buffer[..index]
        }
        None => buffer.as_slice(),
    };

    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ErrorInfo::new("empty_request", "request line was blank"));
    }

    serde_json::from_slice(line).map_err(|err| {
        ErrorInfo::new(
            "invalid_json",
            format!("request line was not valid JSON: {}", err),
        )
    })
}

fn handle_request(request: Request, state: Arc<SharedState>) -> Response {
    if request.protocol_version != PROTOCOL_VERSION {
        return Response::error(
            request.id,
            "protocol_mismatch",
            "unsupported protocol version",
        );
    }

    match request.method {
        Method::GetHealth => Response::ok(
            request.id,
            serde_json::json!({
                "status": "ok",
                "pid": std::process::id(),
                "version": env!("CARGO_PKG_VERSION"),
                "protocol_version": PROTOCOL_VERSION,
                "tracks": state.track_count(),
            }),
        ),
        Method::GetTracks => {
            let snapshot = state.tracks_snapshot();
            tracing::debug!(rows = snapshot.rows.len(), "Tracks snapshot");
            match serde_json::to_value(snapshot) {
                Ok(value) => Response::ok(request.id, value),
                Err(err) => Response::error(
                    request.id,
                    "serialization_error",
                    format!("Failed to serialize tracks: {}", err),
                ),
            }
        }
        Method::GetClasses => {
            let snapshot = state.classes_snapshot();
            tracing::debug!(rows = snapshot.rows.len(), "Classes snapshot");
            match serde_json::to_value(snapshot) {
                Ok(value) => Response::ok(request.id, value),
                Err(err) => Response::error(
                    request.id,
                    "serialization_error",
                    format!("Failed to serialize classes: {}", err),
                ),
            }
        }
        Method::ClearTracks => match state.clear() {
            Ok(()) => {
                info!("Track set cleared");
                Response::ok(request.id, serde_json::json!({"cleared": true}))
            }
            Err(err) => Response::error(
                request.id,
                "clear_error",
                format!("Failed to clear tracks: {}", err),
            ),
        },
        Method::Event => handle_event(request, state),
    }
}

fn handle_event(request: Request, state: Arc<SharedState>) -> Response {
    let params = match request.params {
        Some(params) => params,
        None => return Response::error(request.id, "invalid_params", "event payload is required"),
    };

    let envelope = match parse_event(params) {
        Ok(envelope) => envelope,
        Err(err) => return Response::error_with_info(request.id, err),
    };

    info!(
        kind = ?envelope.kind,
        class = envelope.observation.as_ref().map(|obs| obs.class.as_str()),
        name = envelope.observation.as_ref().map(|obs| obs.name.as_str()),
        "Received event"
    );

    state.apply_event(&envelope);

    Response::ok(request.id, serde_json::json!({"accepted": true}))
}

fn write_response(stream: &mut UnixStream, response: Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut *stream, &response)?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}
