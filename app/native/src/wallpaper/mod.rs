//! Wallpaper rotation: the queue manager, the desktop appliers and the image
//! discovery used when adding wallpapers.

pub mod applier;
pub mod discovery;
pub mod queue;
mod shuffle;

pub use applier::{DesktopApplier, GnomeApplier, WallpaperApplier, validate_image};
pub use queue::{OrderMode, QueueManager};
