//! Desktop wallpaper appliers.
//!
//! An applier hands a file path to the desktop. Failures are split in two:
//! a path that cannot be shown at all is `ApplyFailed` (the caller may drop it
//! from the image list), while a desktop that refuses the change is
//! `NotWritable` (the path itself is fine).

use std::path::Path;
use std::process::Command;

use image::ImageReader;

use crate::error::BackslideError;

/// GSettings schema holding the desktop background.
const GNOME_SCHEMA: &str = "org.gnome.desktop.background";

/// Key holding the background for the light appearance.
const GNOME_KEY: &str = "picture-uri";

/// Key holding the background for the dark appearance (GNOME 42+).
const GNOME_DARK_KEY: &str = "picture-uri-dark";

/// Sets the desktop background.
pub trait WallpaperApplier {
    /// Shows the image at `path` as the desktop background.
    ///
    /// # Errors
    ///
    /// Returns `ApplyFailed` if the path is unreadable or not an image, and
    /// `NotWritable` if the desktop refused the change.
    fn apply(&mut self, path: &str) -> Result<(), BackslideError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Checks that `path` is a regular file holding a recognizable image.
///
/// Only the header is read; the image is not decoded.
///
/// # Errors
///
/// Returns `ApplyFailed` naming the path and the reason.
pub fn validate_image(path: &str) -> Result<(), BackslideError> {
    let fail = |reason: String| BackslideError::apply_failed(path, reason);

    let metadata = std::fs::metadata(path).map_err(|err| fail(err.to_string()))?;
    if !metadata.is_file() {
        return Err(fail("not a regular file".to_string()));
    }

    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|err| fail(err.to_string()))?;

    if reader.format().is_none() {
        return Err(fail("not a recognized image format".to_string()));
    }
    Ok(())
}

/// Applies wallpapers through the `wallpaper` crate, which picks the right
/// mechanism for the running desktop environment.
#[derive(Debug, Default)]
pub struct DesktopApplier;

impl WallpaperApplier for DesktopApplier {
    fn apply(&mut self, path: &str) -> Result<(), BackslideError> {
        validate_image(path)?;

        ::wallpaper::set_from_path(path)
            .map_err(|err| BackslideError::not_writable("wallpaper", err.to_string()))
    }

    fn name(&self) -> &'static str { "desktop" }
}

/// Applies wallpapers by writing the GNOME background keys with `gsettings`.
#[derive(Debug, Default)]
pub struct GnomeApplier;

impl GnomeApplier {
    fn is_writable(key: &str) -> Result<bool, BackslideError> {
        let output = Command::new("gsettings")
            .args(["writable", GNOME_SCHEMA, key])
            .output()
            .map_err(|err| BackslideError::not_writable(key, format!("failed to run gsettings: {err}")))?;

        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    fn set(key: &str, value: &str) -> Result<(), BackslideError> {
        let output = Command::new("gsettings")
            .args(["set", GNOME_SCHEMA, key, value])
            .output()
            .map_err(|err| BackslideError::not_writable(key, format!("failed to run gsettings: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackslideError::not_writable(key, stderr.trim().to_string()));
        }
        Ok(())
    }
}

impl WallpaperApplier for GnomeApplier {
    fn apply(&mut self, path: &str) -> Result<(), BackslideError> {
        validate_image(path)?;

        let uri = file_uri(Path::new(path))?;

        if !Self::is_writable(GNOME_KEY)? {
            return Err(BackslideError::not_writable(GNOME_KEY, "key is locked"));
        }
        Self::set(GNOME_KEY, &uri)?;

        // Best-effort: older GNOME releases have no dark variant
        if let Err(err) = Self::set(GNOME_DARK_KEY, &uri) {
            tracing::debug!(error = %err, "failed to set dark wallpaper");
        }
        Ok(())
    }

    fn name(&self) -> &'static str { "gnome" }
}

/// Builds the `file://` URI GNOME expects for `path`.
fn file_uri(path: &Path) -> Result<String, BackslideError> {
    let abs = path
        .canonicalize()
        .map_err(|err| BackslideError::apply_failed(path.display().to_string(), err.to_string()))?;
    Ok(format!("file://{}", abs.display()))
}
