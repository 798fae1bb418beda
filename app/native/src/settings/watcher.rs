//! Settings file watcher.
//!
//! Watches the settings file so edits made by the CLI or by hand reach the
//! running daemon without a restart.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Debounce duration for settings file changes.
/// Editors and atomic writes trigger several events per save (temp file, rename).
const SETTINGS_DEBOUNCE_MS: u64 = 200;

/// Starts watching the settings file at `path` on a background thread.
///
/// `on_change` runs on the watcher thread once a burst of events touching the
/// file has settled. It should only forward a message to the owning thread.
pub fn watch_settings_file<F>(path: &Path, on_change: F)
where F: Fn() + Send + 'static {
    let settings_path = path.to_path_buf();
    let Some(file_name) = settings_path.file_name().map(OsString::from) else {
        tracing::warn!(path = %settings_path.display(), "settings path has no file name, not watching");
        return;
    };

    std::thread::spawn(move || {
        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create settings watcher");
                return;
            }
        };

        // Watch the parent directory to catch file replacements
        let watch_path = watch_directory(&settings_path);
        if let Err(err) = std::fs::create_dir_all(&watch_path) {
            tracing::warn!(error = %err, path = %watch_path.display(), "failed to create settings directory");
            return;
        }
        if let Err(err) = watcher.watch(&watch_path, RecursiveMode::NonRecursive) {
            tracing::warn!(error = %err, "failed to watch settings file");
            return;
        }

        tracing::debug!(path = %settings_path.display(), "watching settings file");

        debounce_events(&rx, Duration::from_millis(SETTINGS_DEBOUNCE_MS), &file_name, &on_change);
    });
}

/// Calls `on_change` once a burst of events touching `file_name` has been
/// quiet for `debounce`.
///
/// A truncate followed by a write is reported once, after the write.
fn debounce_events<F>(
    rx: &Receiver<notify::Result<notify::Event>>,
    debounce: Duration,
    file_name: &OsString,
    on_change: &F,
) where
    F: Fn(),
{
    let mut pending = false;

    loop {
        let received = if pending {
            rx.recv_timeout(debounce)
        } else {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };

        match received {
            Ok(Ok(event)) => {
                if affects_file(&event.paths, file_name) {
                    pending = true;
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "settings watch error");
            }
            Err(RecvTimeoutError::Timeout) => {
                pending = false;
                on_change();
            }
            Err(RecvTimeoutError::Disconnected) => {
                // Watcher dropped
                if pending {
                    on_change();
                }
                break;
            }
        }
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn affects_file(paths: &[PathBuf], file_name: &OsString) -> bool {
    paths.iter().any(|p| p.file_name().is_some_and(|name| name == file_name))
}
