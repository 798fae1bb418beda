//! Path utilities for BackSlide.
//!
//! Centralizes tilde expansion for user supplied wallpaper paths and the
//! well-known locations of the settings file and the IPC socket.

use std::path::{Path, PathBuf};

use crate::constants::{APP_NAME, SETTINGS_FILE_NAME, SOCKET_FILE_NAME};

/// Expands shell-like paths (tilde) to absolute paths.
///
/// Absolute and relative paths are returned unchanged; a leading `~` is
/// replaced by the user's home directory.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

/// Expands a path and resolves it against `base_dir` when it is relative.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = expand(path);
    if expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Returns the default settings file location.
///
/// `$XDG_CONFIG_HOME/backslide/settings.json`, falling back to
/// `~/.config/backslide/settings.json` when no config directory is known.
#[must_use]
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_NAME)
        .join(SETTINGS_FILE_NAME)
}

/// Returns the directory holding runtime files such as the IPC socket.
///
/// Uses `$XDG_RUNTIME_DIR`, then the cache directory, then `/tmp/backslide`.
#[must_use]
pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(|| dirs::cache_dir().map(|cache| cache.join(APP_NAME)))
        .unwrap_or_else(|| PathBuf::from(format!("/tmp/{APP_NAME}")))
}

/// Returns the path of the daemon's IPC socket.
#[must_use]
pub fn socket_path() -> PathBuf { runtime_dir().join(SOCKET_FILE_NAME) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_empty() {
        assert_eq!(expand(""), PathBuf::new());
        assert_eq!(expand("   "), PathBuf::new());
    }

    #[test]
    fn test_expand_absolute_path() {
        let result = expand("/usr/share/backgrounds/forest.jpg");
        assert_eq!(result, PathBuf::from("/usr/share/backgrounds/forest.jpg"));
    }

    #[test]
    fn test_expand_tilde_path() {
        let result = expand("~/Pictures/lake.png");
        assert!(!result.to_string_lossy().starts_with('~'));
        assert!(result.to_string_lossy().ends_with("Pictures/lake.png"));
    }

    #[test]
    fn test_expand_and_resolve_relative() {
        let base = PathBuf::from("/home/user");
        let result = expand_and_resolve("Pictures/lake.png", &base);
        assert_eq!(result, PathBuf::from("/home/user/Pictures/lake.png"));
    }

    #[test]
    fn test_expand_and_resolve_keeps_absolute() {
        let base = PathBuf::from("/home/user");
        let result = expand_and_resolve("/srv/walls/a.jpg", &base);
        assert_eq!(result, PathBuf::from("/srv/walls/a.jpg"));
    }

    #[test]
    fn test_expand_and_resolve_tilde_ignores_base() {
        let base = PathBuf::from("/base/dir");
        let result = expand_and_resolve("  ~/walls/a.jpg ", &base);
        assert!(!result.to_string_lossy().contains("/base/dir"));
        assert!(result.to_string_lossy().ends_with("walls/a.jpg"));
    }

    #[test]
    fn test_default_settings_path_names() {
        let path = default_settings_path();
        assert!(path.ends_with("backslide/settings.json"));
    }

    #[test]
    fn test_socket_path_file_name() {
        let path = socket_path();
        assert!(path.to_string_lossy().ends_with("backslide.sock"));
    }
}
