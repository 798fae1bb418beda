//! Error types for BackSlide.
//!
//! This module provides the unified error type used by the settings store,
//! the wallpaper queue, the interval timer and the CLI. Every failure in the
//! rotation core is a one-shot report: nothing here is retried automatically.

use thiserror::Error;

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum BackslideError {
    /// Malformed input to a setter or command (e.g. a delay of one minute).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The settings backend or the desktop refused a write.
    #[error("Key '{key}' is not writable: {reason}")]
    NotWritable { key: String, reason: String },
    /// The wallpaper path is unreadable or not an image.
    #[error("Failed to apply wallpaper {path}: {reason}")]
    ApplyFailed { path: String, reason: String },
    /// The timer fired or the queue advanced with no consumer registered.
    #[error("No callback configured")]
    NoCallback,
    /// The queue has nothing to serve.
    #[error("No wallpapers configured")]
    EmptySource,
    /// The settings document could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Communication with the daemon failed.
    #[error("IPC error: {0}")]
    IpcError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
}

impl BackslideError {
    /// Builds a `NotWritable` error for the given key.
    pub fn not_writable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotWritable { key: key.into(), reason: reason.into() }
    }

    /// Builds an `ApplyFailed` error for the given wallpaper path.
    pub fn apply_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApplyFailed { path: path.into(), reason: reason.into() }
    }
}

impl From<std::io::Error> for BackslideError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for BackslideError {
    fn from(err: serde_json::Error) -> Self { Self::ConfigError(err.to_string()) }
}
