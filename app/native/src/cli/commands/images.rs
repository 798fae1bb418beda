//! Image list editing for `add`, `remove` and `move`.
//!
//! These commands edit the settings file directly. A running daemon notices
//! the change through its file watcher and syncs its queue.

use std::path::Path;

use super::types::Position;
use crate::error::BackslideError;
use crate::platform::path::{expand, expand_and_resolve};
use crate::settings::Settings;
use crate::wallpaper::discovery::discover;

/// Discovers images under `inputs` and appends the new ones to the list.
///
/// Returns the number of paths added.
///
/// # Errors
///
/// Returns `InvalidArgument` if no image was found, or `NotWritable` if the
/// settings file could not be written.
pub fn add(settings: &Settings, inputs: &[String], base_dir: &Path) -> Result<usize, BackslideError> {
    let found = discover(inputs, base_dir);
    if found.is_empty() {
        return Err(BackslideError::InvalidArgument(
            "no images found in the given paths".to_string(),
        ));
    }
    settings.add_images(found)
}

/// Removes entries given either as 1-based positions or as paths.
///
/// Every target is resolved against the list before anything is removed,
/// so positions refer to the list as it was shown.
///
/// # Errors
///
/// Returns `InvalidArgument` if a target matches no entry, or `NotWritable`
/// if the settings file could not be written.
pub fn remove(
    settings: &Settings,
    targets: &[String],
    base_dir: &Path,
) -> Result<Vec<String>, BackslideError> {
    let list = settings.image_list();
    let mut doomed = Vec::with_capacity(targets.len());

    for target in targets {
        let entry = resolve_target(target, &list, base_dir).ok_or_else(|| {
            BackslideError::InvalidArgument(format!("'{target}' is not in the image list"))
        })?;
        if !doomed.contains(&entry) {
            doomed.push(entry);
        }
    }

    let remaining = list.into_iter().filter(|entry| !doomed.contains(entry)).collect();
    settings.set_image_list(remaining)?;
    Ok(doomed)
}

/// Moves the entry at `from` to `to`.
///
/// # Errors
///
/// Returns `InvalidArgument` if either position is past the end of the list.
pub fn move_entry(settings: &Settings, from: Position, to: Position) -> Result<(), BackslideError> {
    let len = settings.image_list().len();
    if let Some(position) = [from, to].into_iter().find(|p| p.as_zero_based() >= len) {
        return Err(BackslideError::InvalidArgument(format!(
            "position {position} is past the end of the list ({len} entries)"
        )));
    }
    settings.move_image(from.as_zero_based(), to.as_zero_based())
}

fn resolve_target(target: &str, list: &[String], base_dir: &Path) -> Option<String> {
    if let Ok(position) = target.parse::<Position>() {
        return list.get(position.as_zero_based()).cloned();
    }

    if list.iter().any(|entry| entry == target) {
        return Some(target.to_string());
    }

    let resolved = expand_and_resolve(target, base_dir);
    list.iter().find(|entry| expand(entry) == resolved).cloned()
}
