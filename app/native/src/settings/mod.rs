//! Settings store for BackSlide.
//!
//! A typed key-value store with change notification. Reads come from an
//! in-memory cache; writes go through a [`SettingsBackend`] first and only
//! update the cache (and notify subscribers) once the backend committed them.
//!
//! Callbacks are dispatched synchronously on the calling thread. A callback may
//! call back into the store (re-entrancy is safe because the store is
//! single-threaded and no borrow is held while callbacks run); anything that
//! crosses threads must be forwarded through a channel instead.

mod backend;
mod types;
mod watcher;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub use backend::{JsonFileBackend, MemoryBackend, SettingsBackend};
pub use types::{Key, SettingChange, SettingsData, parse_delay, validate_delay};
pub use watcher::watch_settings_file;

use crate::error::BackslideError;

type Callback = Rc<dyn Fn(&SettingChange)>;

/// The settings store shared by the queue manager, the timer and the daemon.
pub struct Settings {
    backend: Box<dyn SettingsBackend>,
    data: RefCell<SettingsData>,
    subscribers: RefCell<Vec<(Key, Callback)>>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("data", &self.data.borrow())
            .field("path", &self.backend.path())
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Opens the store over `backend`, loading the current document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the stored document cannot be read or parsed.
    pub fn open(backend: Box<dyn SettingsBackend>) -> Result<Self, BackslideError> {
        let data = backend.load()?.unwrap_or_default().sanitized();

        Ok(Self {
            backend,
            data: RefCell::new(data),
            subscribers: RefCell::new(Vec::new()),
        })
    }

    /// Opens the store backed by the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn from_file(path: PathBuf) -> Result<Self, BackslideError> {
        Self::open(Box::new(JsonFileBackend::new(path)))
    }

    /// Creates a store backed by `backend` kept in memory.
    #[must_use]
    pub fn in_memory(backend: MemoryBackend) -> Self {
        let data = backend.stored().sanitized();
        Self {
            backend: Box::new(backend),
            data: RefCell::new(data),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Returns the file backing the store, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> { self.backend.path() }

    /// Returns a copy of the whole cached document.
    #[must_use]
    pub fn snapshot(&self) -> SettingsData { self.data.borrow().clone() }

    /// Minutes between two wallpaper changes.
    #[must_use]
    pub fn delay(&self) -> u32 { self.data.borrow().delay }

    /// Sets the delay in minutes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for delays of one minute or less (nothing is
    /// written), or `NotWritable` if the backend refused the write.
    pub fn set_delay(&self, minutes: u32) -> Result<(), BackslideError> {
        let minutes = validate_delay(minutes)?;
        self.set(SettingChange::Delay(minutes))
    }

    /// Whether the wallpaper order is shuffled.
    #[must_use]
    pub fn is_random(&self) -> bool { self.data.borrow().random }

    /// Sets whether the wallpaper order is shuffled.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the backend refused the write.
    pub fn set_random(&self, random: bool) -> Result<(), BackslideError> {
        self.set(SettingChange::Random(random))
    }

    /// The master list of wallpaper paths.
    #[must_use]
    pub fn image_list(&self) -> Vec<String> { self.data.borrow().image_list.clone() }

    /// Replaces the master list of wallpaper paths.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the backend refused the write.
    pub fn set_image_list(&self, list: Vec<String>) -> Result<(), BackslideError> {
        self.set(SettingChange::ImageList(list))
    }

    /// Minutes already waited within the current interval.
    #[must_use]
    pub fn elapsed_time(&self) -> u32 { self.data.borrow().elapsed_time }

    /// Persists the minutes already waited within the current interval.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the backend refused the write.
    pub fn set_elapsed_time(&self, minutes: u32) -> Result<(), BackslideError> {
        self.set(SettingChange::ElapsedTime(minutes))
    }

    /// Appends paths to the image list, skipping ones already present.
    ///
    /// Returns the number of paths actually added.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the backend refused the write.
    pub fn add_images<I>(&self, paths: I) -> Result<usize, BackslideError>
    where I: IntoIterator<Item = String> {
        let mut list = self.image_list();
        let before = list.len();
        for path in paths {
            if !list.contains(&path) {
                list.push(path);
            }
        }

        let added = list.len() - before;
        if added > 0 {
            self.set_image_list(list)?;
        }
        Ok(added)
    }

    /// Removes a path from the image list. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the backend refused the write.
    pub fn remove_image(&self, path: &str) -> Result<bool, BackslideError> {
        let mut list = self.image_list();
        let before = list.len();
        list.retain(|entry| entry != path);

        if list.len() == before {
            return Ok(false);
        }
        self.set_image_list(list)?;
        Ok(true)
    }

    /// Moves the image at index `from` to index `to` (both 0-based).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either index is out of range, or
    /// `NotWritable` if the backend refused the write.
    pub fn move_image(&self, from: usize, to: usize) -> Result<(), BackslideError> {
        let mut list = self.image_list();
        if from >= list.len() || to >= list.len() {
            return Err(BackslideError::InvalidArgument(format!(
                "position out of range (list has {} entries)",
                list.len()
            )));
        }

        let entry = list.remove(from);
        list.insert(to, entry);
        self.set_image_list(list)
    }

    /// Subscribes `callback` to changes of `key`.
    ///
    /// The callback receives the new value after it was committed.
    pub fn bind_key<F>(&self, key: Key, callback: F)
    where F: Fn(&SettingChange) + 'static {
        self.subscribers.borrow_mut().push((key, Rc::new(callback)));
    }

    /// Re-reads the backend and notifies subscribers of every changed key.
    ///
    /// Returns the changes that were dispatched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the stored document cannot be read or parsed.
    /// The cached values are left untouched in that case.
    pub fn reload(&self) -> Result<Vec<SettingChange>, BackslideError> {
        let fresh = self.backend.load()?.unwrap_or_default().sanitized();
        let changes = fresh.changes_from(&self.data.borrow());
        *self.data.borrow_mut() = fresh;

        for change in &changes {
            tracing::debug!(key = %change.key(), "setting changed externally");
            self.dispatch(change);
        }
        Ok(changes)
    }

    /// Writes a value through the backend, then caches and dispatches it.
    fn set(&self, change: SettingChange) -> Result<(), BackslideError> {
        if self.data.borrow().value(change.key()) == change {
            return Ok(());
        }

        self.backend.write(&change)?;
        self.data.borrow_mut().apply(&change);
        self.dispatch(&change);
        Ok(())
    }

    fn dispatch(&self, change: &SettingChange) {
        // Collect first so callbacks may subscribe or write without a held borrow
        let callbacks: Vec<Callback> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|(key, _)| *key == change.key())
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn store_with(data: SettingsData) -> (Settings, MemoryBackend) {
        let backend = MemoryBackend::new(data);
        (Settings::in_memory(backend.clone()), backend)
    }

    // ========================================================================
    // Getters and setters
    // ========================================================================

    #[test]
    fn test_set_delay_writes_through() {
        let (settings, backend) = store_with(SettingsData::default());
        settings.set_delay(15).unwrap();
        assert_eq!(settings.delay(), 15);
        assert_eq!(backend.stored().delay, 15);
    }

    #[test]
    fn test_set_delay_rejects_small_values_without_mutation() {
        let (settings, backend) = store_with(SettingsData::default());
        let err = settings.set_delay(1).unwrap_err();
        assert!(matches!(err, BackslideError::InvalidArgument(_)));
        assert_eq!(settings.delay(), 20);
        assert_eq!(backend.stored().delay, 20);
    }

    #[test]
    fn test_failed_write_keeps_cached_value() {
        let (settings, backend) = store_with(SettingsData::default());
        backend.set_writable(false);

        let err = settings.set_random(false).unwrap_err();
        assert!(matches!(err, BackslideError::NotWritable { .. }));
        assert!(settings.is_random());
    }

    #[test]
    fn test_elapsed_time_round_trip() {
        let (settings, _) = store_with(SettingsData::default());
        settings.set_elapsed_time(6).unwrap();
        assert_eq!(settings.elapsed_time(), 6);
    }

    #[test]
    fn test_loaded_small_delay_is_sanitized() {
        let (settings, _) = store_with(SettingsData { delay: 0, ..SettingsData::default() });
        assert_eq!(settings.delay(), 20);
    }

    // ========================================================================
    // Image list editing
    // ========================================================================

    #[test]
    fn test_add_images_skips_duplicates() {
        let (settings, _) = store_with(SettingsData {
            image_list: vec!["/a.jpg".to_string()],
            ..SettingsData::default()
        });

        let added = settings
            .add_images(["/a.jpg".to_string(), "/b.jpg".to_string(), "/b.jpg".to_string()])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(settings.image_list(), vec!["/a.jpg", "/b.jpg"]);
    }

    #[test]
    fn test_remove_image() {
        let (settings, _) = store_with(SettingsData {
            image_list: vec!["/a.jpg".to_string(), "/b.jpg".to_string()],
            ..SettingsData::default()
        });

        assert!(settings.remove_image("/a.jpg").unwrap());
        assert!(!settings.remove_image("/missing.jpg").unwrap());
        assert_eq!(settings.image_list(), vec!["/b.jpg"]);
    }

    #[test]
    fn test_move_image() {
        let (settings, _) = store_with(SettingsData {
            image_list: vec!["/a".to_string(), "/b".to_string(), "/c".to_string()],
            ..SettingsData::default()
        });

        settings.move_image(2, 0).unwrap();
        assert_eq!(settings.image_list(), vec!["/c", "/a", "/b"]);

        let err = settings.move_image(0, 3).unwrap_err();
        assert!(matches!(err, BackslideError::InvalidArgument(_)));
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    #[test]
    fn test_bind_key_receives_new_value() {
        let (settings, _) = store_with(SettingsData::default());
        let seen = Rc::new(Cell::new(0));
        let seen_cb = Rc::clone(&seen);
        settings.bind_key(Key::Delay, move |change| {
            if let SettingChange::Delay(minutes) = change {
                seen_cb.set(*minutes);
            }
        });

        settings.set_delay(33).unwrap();
        assert_eq!(seen.get(), 33);
    }

    #[test]
    fn test_callbacks_only_fire_for_their_key_and_real_changes() {
        let (settings, _) = store_with(SettingsData::default());
        let calls = Rc::new(Cell::new(0));
        let calls_cb = Rc::clone(&calls);
        settings.bind_key(Key::Random, move |_| calls_cb.set(calls_cb.get() + 1));

        settings.set_delay(10).unwrap();
        settings.set_random(true).unwrap(); // unchanged
        assert_eq!(calls.get(), 0);

        settings.set_random(false).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_callback_may_write_reentrantly() {
        let (settings, _) = store_with(SettingsData::default());
        let settings = Rc::new(settings);
        let weak = Rc::downgrade(&settings);
        settings.bind_key(Key::Delay, move |_| {
            if let Some(settings) = weak.upgrade() {
                settings.set_elapsed_time(0).unwrap();
                settings.set_elapsed_time(1).unwrap();
            }
        });

        settings.set_delay(9).unwrap();
        assert_eq!(settings.elapsed_time(), 1);
    }

    #[test]
    fn test_reload_dispatches_external_changes() {
        let (settings, backend) = store_with(SettingsData::default());
        let delays = Rc::new(RefCell::new(Vec::new()));
        let delays_cb = Rc::clone(&delays);
        settings.bind_key(Key::Delay, move |change| {
            if let SettingChange::Delay(minutes) = change {
                delays_cb.borrow_mut().push(*minutes);
            }
        });

        backend.replace(SettingsData { delay: 45, ..SettingsData::default() });
        let changes = settings.reload().unwrap();

        assert_eq!(changes, vec![SettingChange::Delay(45)]);
        assert_eq!(*delays.borrow(), vec![45]);
        assert!(settings.reload().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings::from_file(path.clone()).unwrap();
        assert_eq!(settings.snapshot(), SettingsData::default());
        settings.add_images(["/walls/a.png".to_string()]).unwrap();
        settings.set_delay(4).unwrap();

        let reopened = Settings::from_file(path).unwrap();
        assert_eq!(reopened.delay(), 4);
        assert_eq!(reopened.image_list(), vec!["/walls/a.png"]);
        assert_eq!(reopened.path(), settings.path());
    }
}
