//! Shared types for CLI commands.

use std::str::FromStr;

use crate::wallpaper::{DesktopApplier, GnomeApplier, OrderMode, WallpaperApplier};

/// How the daemon sets the desktop background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Detect the desktop environment and use its native mechanism.
    #[default]
    Desktop,
    /// Write the GNOME background keys with `gsettings`.
    Gnome,
}

impl Backend {
    /// Creates the applier for this backend.
    #[must_use]
    pub fn applier(self) -> Box<dyn WallpaperApplier> {
        match self {
            Self::Desktop => Box::new(DesktopApplier),
            Self::Gnome => Box::new(GnomeApplier),
        }
    }
}

/// Wallpaper order accepted by `backslide order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Order {
    /// Shuffle the wallpapers.
    Random,
    /// Follow the image list.
    Sequential,
}

impl From<Order> for OrderMode {
    fn from(order: Order) -> Self {
        match order {
            Order::Random => Self::Random,
            Order::Sequential => Self::Sequential,
        }
    }
}

/// A 1-based position in the image list.
///
/// Users count from one; the settings store counts from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(usize);

impl Position {
    /// Creates a position from a 1-based index.
    #[must_use]
    pub const fn new(index: usize) -> Self { Self(index) }

    /// Returns the 0-based index for internal use.
    #[must_use]
    pub const fn as_zero_based(self) -> usize { self.0.saturating_sub(1) }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<usize>() {
            Ok(index) if index > 0 => Ok(Self(index)),
            _ => Err(format!("Invalid position '{s}'. Expected a positive integer.")),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}
