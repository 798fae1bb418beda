//! Image discovery for the `add` command.
//!
//! Turns user supplied paths (files or folders) into the absolute image paths
//! stored in the settings image list.

use std::fs;
use std::path::{Path, PathBuf};

use natord::compare;

/// File extensions recognized as wallpapers when scanning folders.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Checks if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Lists all supported images below `dir`, descending into sub-folders.
///
/// Hidden files and folders are skipped. Results are sorted naturally so a
/// sequential slideshow follows the order a file manager would show.
#[must_use]
pub fn list_images_in_directory(dir: &Path) -> Vec<PathBuf> {
    let mut images = Vec::new();
    collect_images(dir, &mut images);

    images.sort_by(|a, b| compare(a.to_string_lossy().as_ref(), b.to_string_lossy().as_ref()));
    images
}

fn collect_images(dir: &Path, images: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, path = %dir.display(), "failed to read folder");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }

        if path.is_dir() {
            collect_images(&path, images);
        } else if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
}

/// Resolves user supplied paths into image paths.
///
/// Folders are scanned recursively. Files need an image extension. Relative
/// paths are resolved against `base_dir`; anything else is reported and skipped.
#[must_use]
pub fn discover<S: AsRef<str>>(inputs: &[S], base_dir: &Path) -> Vec<String> {
    let mut found = Vec::new();

    for input in inputs {
        let path = crate::platform::path::expand_and_resolve(input.as_ref(), base_dir);

        if path.is_dir() {
            found.extend(list_images_in_directory(&path));
        } else if path.is_file() && is_supported_image(&path) {
            found.push(path);
        } else if path.is_file() {
            tracing::warn!(path = %path.display(), "not an image file, skipping");
        } else {
            tracing::warn!(path = %path.display(), "no such file or folder, skipping");
        }
    }

    found.into_iter().map(|path| path.display().to_string()).collect()
}
