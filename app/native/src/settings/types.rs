//! Settings document types.
//!
//! The settings document is a flat key-value map persisted as JSON. Key names
//! use kebab-case (`delay`, `random`, `image-list`, `elapsed-time`) and every
//! key has a default, so a partial or missing document is always valid.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::BackslideError;

/// A key of the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Minutes between two wallpaper changes.
    Delay,
    /// Whether the wallpaper order is shuffled.
    Random,
    /// The master list of wallpaper paths.
    ImageList,
    /// Minutes already waited within the current interval.
    ElapsedTime,
}

impl Key {
    /// All keys, in document order.
    pub const ALL: [Self; 4] = [Self::Delay, Self::Random, Self::ImageList, Self::ElapsedTime];

    /// Returns the persisted name of the key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::Random => "random",
            Self::ImageList => "image-list",
            Self::ElapsedTime => "elapsed-time",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A typed value for a single key, used both for writes and change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Delay(u32),
    Random(bool),
    ImageList(Vec<String>),
    ElapsedTime(u32),
}

impl SettingChange {
    /// Returns the key this value belongs to.
    #[must_use]
    pub const fn key(&self) -> Key {
        match self {
            Self::Delay(_) => Key::Delay,
            Self::Random(_) => Key::Random,
            Self::ImageList(_) => Key::ImageList,
            Self::ElapsedTime(_) => Key::ElapsedTime,
        }
    }

    /// Returns the JSON representation stored under the key.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Delay(minutes) | Self::ElapsedTime(minutes) => serde_json::Value::from(*minutes),
            Self::Random(random) => serde_json::Value::Bool(*random),
            Self::ImageList(list) => serde_json::Value::from(list.clone()),
        }
    }
}

/// The BackSlide settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettingsData {
    /// Minutes between two wallpaper changes. Must be greater than 1.
    pub delay: u32,

    /// Whether the wallpaper order is shuffled ("random") or follows the
    /// image list ("sequential").
    pub random: bool,

    /// Absolute paths of the wallpapers to cycle through, in presentation order.
    /// A leading `~` is expanded to the home directory.
    pub image_list: Vec<String>,

    /// Minutes already waited within the current interval. Maintained by the
    /// daemon so a restart resumes mid-interval.
    pub elapsed_time: u32,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            delay: defaults::DELAY_MINUTES,
            random: defaults::RANDOM,
            image_list: Vec::new(),
            elapsed_time: 0,
        }
    }
}

impl SettingsData {
    /// Returns the current value of `key`.
    #[must_use]
    pub fn value(&self, key: Key) -> SettingChange {
        match key {
            Key::Delay => SettingChange::Delay(self.delay),
            Key::Random => SettingChange::Random(self.random),
            Key::ImageList => SettingChange::ImageList(self.image_list.clone()),
            Key::ElapsedTime => SettingChange::ElapsedTime(self.elapsed_time),
        }
    }

    /// Stores a single value.
    pub fn apply(&mut self, change: &SettingChange) {
        match change {
            SettingChange::Delay(minutes) => self.delay = *minutes,
            SettingChange::Random(random) => self.random = *random,
            SettingChange::ImageList(list) => self.image_list.clone_from(list),
            SettingChange::ElapsedTime(minutes) => self.elapsed_time = *minutes,
        }
    }

    /// Returns the values of every key that differs from `previous`.
    #[must_use]
    pub fn changes_from(&self, previous: &Self) -> Vec<SettingChange> {
        Key::ALL
            .into_iter()
            .map(|key| self.value(key))
            .filter(|value| *value != previous.value(value.key()))
            .collect()
    }

    /// Replaces values the settings layer would have rejected on write.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if validate_delay(self.delay).is_err() {
            tracing::warn!(
                delay = self.delay,
                fallback = defaults::DELAY_MINUTES,
                "stored delay is too small, using the default"
            );
            self.delay = defaults::DELAY_MINUTES;
        }
        self
    }
}

/// Checks that a delay is at least [`defaults::MIN_DELAY_MINUTES`].
///
/// # Errors
///
/// Returns `InvalidArgument` for delays of one minute or less.
pub fn validate_delay(minutes: u32) -> Result<u32, BackslideError> {
    if minutes < defaults::MIN_DELAY_MINUTES {
        return Err(BackslideError::InvalidArgument(format!(
            "delay must be greater than 1 minute, got {minutes}"
        )));
    }
    Ok(minutes)
}

/// Parses a delay given as text, as typed on the command line.
///
/// # Errors
///
/// Returns `InvalidArgument` if the text is not a whole number of minutes
/// or the number is too small.
pub fn parse_delay(text: &str) -> Result<u32, BackslideError> {
    let minutes = text.trim().parse::<u32>().map_err(|_| {
        BackslideError::InvalidArgument(format!("delay must be a whole number of minutes: '{text}'"))
    })?;
    validate_delay(minutes)
}
