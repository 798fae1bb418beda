//! Unix Domain Socket IPC between the CLI and the daemon.
//!
//! # Architecture
//!
//! - The daemon starts a Unix Domain Socket server on startup
//! - CLI commands connect to the socket, send a JSON request, and receive a JSON response
//! - If the socket doesn't exist or connection fails, the daemon is not running
//!
//! # Request Format
//!
//! Requests are JSON objects with a `type` field:
//!
//! ```json
//! {"type": "next"}
//! {"type": "status"}
//! ```
//!
//! # Response Format
//!
//! Responses are JSON with either `data` or `error`:
//!
//! ```json
//! {"data": {"running": true, "delay": 20}}
//! {"error": "No wallpapers configured"}
//! ```

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BackslideError;

/// Default timeout for socket operations in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Number of retry attempts for transient connection failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retry attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 100;

// ============================================================================
// Request Types
// ============================================================================

/// Requests the CLI can send to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IpcRequest {
    /// Check that the daemon is alive.
    Ping,
    /// Show the next wallpaper now.
    Next,
    /// Stop the timer, keeping the minutes already waited.
    Pause,
    /// Start the timer again.
    Resume,
    /// Reshuffle the remaining queue (switching to random order).
    Shuffle,
    /// Report the daemon state.
    Status,
}

/// Response from the daemon to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResponse {
    /// Successful response with data.
    Success { data: serde_json::Value },
    /// Error response.
    Error { error: String },
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(data: impl Serialize) -> Self {
        Self::Success {
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self { Self::Error { error: message.into() } }

    /// Converts the response into its data, turning an error response into an error.
    ///
    /// # Errors
    ///
    /// Returns `IpcError` carrying the daemon's message.
    pub fn into_result(self) -> Result<serde_json::Value, BackslideError> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Error { error } => Err(BackslideError::IpcError(error)),
        }
    }
}

/// Snapshot of the daemon state returned by [`IpcRequest::Status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Whether the timer is counting down.
    pub running: bool,
    /// Minutes between two wallpaper changes.
    pub delay: u32,
    /// Whole minutes waited within the current interval.
    pub elapsed: u32,
    /// Seconds until the next change, when running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// `random` or `sequential`.
    pub mode: String,
    /// The wallpaper shown now.
    pub current: Option<String>,
    /// The wallpaper shown next.
    pub preview: Option<String>,
    /// Number of queued wallpapers.
    pub queued: usize,
}

// ============================================================================
// Server (Daemon Side)
// ============================================================================

/// A running IPC server. Dropping it stops the server and removes the socket.
#[derive(Debug)]
pub struct IpcServer {
    path: PathBuf,
    running: Arc<AtomicBool>,
}

impl IpcServer {
    /// Binds the socket at `path` and serves requests on a background thread.
    ///
    /// Each connection is handled on its own thread; `handler` must hand the
    /// request over to whoever owns the daemon state.
    ///
    /// # Errors
    ///
    /// Returns `IpcError` if another daemon already answers on `path` or the
    /// socket cannot be bound.
    pub fn start<F>(path: &Path, handler: F) -> Result<Self, BackslideError>
    where F: Fn(IpcRequest) -> IpcResponse + Send + Sync + 'static {
        if path.exists() {
            if send_request_once(path, &IpcRequest::Ping).is_ok() {
                return Err(BackslideError::IpcError(format!(
                    "another daemon is already listening on {}",
                    path.display()
                )));
            }
            // Stale socket left by a daemon that did not shut down cleanly
            let _ = std::fs::remove_file(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path).map_err(|err| {
            BackslideError::IpcError(format!("failed to bind {}: {err}", path.display()))
        })?;

        tracing::info!(path = %path.display(), "ipc server listening");

        let running = Arc::new(AtomicBool::new(true));
        let handler = Arc::new(handler);
        let flag = Arc::clone(&running);
        thread::Builder::new()
            .name("ipc-server".to_string())
            .spawn(move || server_loop(&listener, &flag, &handler))?;

        Ok(Self { path: path.to_path_buf(), running })
    }

    /// Stops accepting connections and removes the socket file.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // Wake the accept loop so it notices the flag
        let _ = UnixStream::connect(&self.path);
        let _ = std::fs::remove_file(&self.path);
        tracing::debug!(path = %self.path.display(), "ipc server stopped");
    }

    /// Path of the socket.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }
}

impl Drop for IpcServer {
    fn drop(&mut self) { self.stop(); }
}

/// Main server loop that accepts connections.
fn server_loop<F>(listener: &UnixListener, running: &AtomicBool, handler: &Arc<F>)
where F: Fn(IpcRequest) -> IpcResponse + Send + Sync + 'static {
    for stream in listener.incoming() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match stream {
            Ok(stream) => {
                let handler = Arc::clone(handler);
                thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, handler.as_ref()) {
                        tracing::debug!(error = %err, "ipc connection failed");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "ipc connection error");
            }
        }
    }
}

/// Handles a single client connection.
fn handle_connection<F>(stream: UnixStream, handler: &F) -> std::io::Result<()>
where F: Fn(IpcRequest) -> IpcResponse {
    stream.set_read_timeout(Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)))?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(());
    }

    let response = match serde_json::from_str::<IpcRequest>(line.trim()) {
        Ok(request) => handler(request),
        Err(err) => IpcResponse::error(format!("Invalid request: {err}")),
    };

    let response_json = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error":"Failed to serialize response"}"#.to_string());

    let mut stream = reader.into_inner();
    writeln!(stream, "{response_json}")
}

// ============================================================================
// Client (CLI Side)
// ============================================================================

/// Error type for IPC client operations.
#[derive(Debug)]
pub enum IpcError {
    /// Daemon is not running (socket doesn't exist or can't connect).
    DaemonNotRunning,
    /// Connection timeout.
    Timeout,
    /// IO error.
    Io(std::io::Error),
    /// Invalid response from the daemon.
    InvalidResponse(String),
}

impl std::fmt::Display for IpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DaemonNotRunning => {
                write!(f, "BackSlide daemon is not running (start it with `backslide daemon`)")
            }
            Self::Timeout => write!(f, "Connection timed out"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
        }
    }
}

impl std::error::Error for IpcError {}

impl From<IpcError> for BackslideError {
    fn from(err: IpcError) -> Self { Self::IpcError(err.to_string()) }
}

/// Sends a request to the daemon listening on `path` and returns the response.
///
/// Automatically retries on transient connection failures (up to 3 attempts).
///
/// # Errors
///
/// Returns `DaemonNotRunning` if nothing answers on `path`, or the
/// transport error that ended the exchange.
pub fn send_request(path: &Path, request: &IpcRequest) -> Result<IpcResponse, IpcError> {
    let mut last_error = IpcError::DaemonNotRunning;

    for attempt in 0..MAX_RETRIES {
        match send_request_once(path, request) {
            Ok(response) => return Ok(response),
            Err(e) => {
                last_error = e;

                // Only connection failures are transient
                if !matches!(last_error, IpcError::DaemonNotRunning) {
                    break;
                }

                if attempt < MAX_RETRIES - 1 {
                    thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
                }
            }
        }
    }

    Err(last_error)
}

/// Sends a request once without retrying.
fn send_request_once(path: &Path, request: &IpcRequest) -> Result<IpcResponse, IpcError> {
    if !path.exists() {
        return Err(IpcError::DaemonNotRunning);
    }

    let mut stream = UnixStream::connect(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::ConnectionRefused
        | std::io::ErrorKind::NotFound
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::ConnectionReset => IpcError::DaemonNotRunning,
        _ => IpcError::Io(e),
    })?;

    let timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
    stream.set_read_timeout(Some(timeout)).map_err(IpcError::Io)?;
    stream.set_write_timeout(Some(timeout)).map_err(IpcError::Io)?;

    let request_json = serde_json::to_string(request)
        .map_err(|e| IpcError::InvalidResponse(format!("Failed to serialize request: {e}")))?;

    writeln!(stream, "{request_json}").map_err(|e| {
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            IpcError::DaemonNotRunning
        } else {
            IpcError::Io(e)
        }
    })?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line).map_err(|e| match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => IpcError::Timeout,
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
            IpcError::DaemonNotRunning
        }
        _ => IpcError::Io(e),
    })?;

    serde_json::from_str(response_line.trim())
        .map_err(|e| IpcError::InvalidResponse(format!("Failed to parse response: {e}")))
}
