//! Application constants for BackSlide.
//!
//! This module contains global constants used throughout the application,
//! including the application name, file names and the default settings.

/// The application name, used for directory and socket names.
pub const APP_NAME: &str = "backslide";

/// Application version from Cargo.toml.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the settings file location.
pub const SETTINGS_ENV_VAR: &str = "BACKSLIDE_SETTINGS";

/// Settings file name inside the configuration directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// IPC socket file name inside the runtime directory.
pub const SOCKET_FILE_NAME: &str = "backslide.sock";

/// Milliseconds per minute, the unit of every delay and elapsed value.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Default values for the settings document.
pub mod defaults {
    /// Minutes between two wallpaper changes.
    pub const DELAY_MINUTES: u32 = 20;

    /// Smallest delay accepted by the settings store.
    pub const MIN_DELAY_MINUTES: u32 = 2;

    /// Whether the wallpaper order is shuffled.
    pub const RANDOM: bool = true;
}
