//! Storage backends for the settings store.
//!
//! Writes are per key: the file backend re-reads the document, replaces only
//! the written key and atomically swaps the file, so the daemon and the CLI
//! can update different keys of the same file without clobbering each other.

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::types::{SettingChange, SettingsData};
use crate::error::BackslideError;

/// Persistence for the settings document.
pub trait SettingsBackend {
    /// Reads the whole document. Returns `Ok(None)` when nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the stored document cannot be read or parsed.
    fn load(&self) -> Result<Option<SettingsData>, BackslideError>;

    /// Persists a single key.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the write did not commit.
    fn write(&self, change: &SettingChange) -> Result<(), BackslideError>;

    /// Returns the file backing this store, if any.
    fn path(&self) -> Option<&Path> { None }
}

/// Settings stored in a JSON file. Comments are tolerated on read.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend for the file at `path`. The file does not need to exist.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self { Self { path } }

    /// Reads the raw document as a JSON object, empty if the file is missing.
    fn read_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, BackslideError> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = json_comments::StripComments::new(file);
        match serde_json::from_reader(reader)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(BackslideError::ConfigError(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl SettingsBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<SettingsData>, BackslideError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = fs::File::open(&self.path)?;
        let reader = json_comments::StripComments::new(file);
        let data = serde_json::from_reader(reader).map_err(|err| {
            BackslideError::ConfigError(format!("{}: {err}", self.path.display()))
        })?;
        Ok(Some(data))
    }

    fn write(&self, change: &SettingChange) -> Result<(), BackslideError> {
        let key = change.key();
        let not_writable = |reason: String| BackslideError::not_writable(key.name(), reason);

        let mut document = self.read_document().map_err(|err| not_writable(err.to_string()))?;
        document.insert(key.name().to_string(), change.to_json());

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|err| not_writable(err.to_string()))?;

        // Write next to the target so the final rename stays on one filesystem
        let mut tmp =
            tempfile::NamedTempFile::new_in(parent).map_err(|err| not_writable(err.to_string()))?;
        serde_json::to_writer_pretty(&mut tmp, &serde_json::Value::Object(document))
            .map_err(|err| not_writable(err.to_string()))?;
        tmp.write_all(b"\n").map_err(|err| not_writable(err.to_string()))?;
        tmp.persist(&self.path).map_err(|err| not_writable(err.error.to_string()))?;

        tracing::debug!(key = %key, path = %self.path.display(), "setting written");
        Ok(())
    }

    fn path(&self) -> Option<&Path> { Some(&self.path) }
}

#[derive(Debug)]
struct MemoryInner {
    data: SettingsData,
    writable: bool,
}

/// Settings kept in memory. Clones share the same storage.
///
/// A read-only memory backend models a locked-down key-value store whose
/// writes never commit.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryBackend {
    /// Creates a writable backend holding `data`.
    #[must_use]
    pub fn new(data: SettingsData) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryInner { data, writable: true })),
        }
    }

    /// Allows or refuses subsequent writes.
    pub fn set_writable(&self, writable: bool) { self.inner.borrow_mut().writable = writable; }

    /// Replaces the stored document, as an external writer would.
    pub fn replace(&self, data: SettingsData) { self.inner.borrow_mut().data = data; }

    /// Returns a copy of the stored document.
    #[must_use]
    pub fn stored(&self) -> SettingsData { self.inner.borrow().data.clone() }
}

impl Default for MemoryBackend {
    fn default() -> Self { Self::new(SettingsData::default()) }
}

impl SettingsBackend for MemoryBackend {
    fn load(&self) -> Result<Option<SettingsData>, BackslideError> {
        Ok(Some(self.inner.borrow().data.clone()))
    }

    fn write(&self, change: &SettingChange) -> Result<(), BackslideError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.writable {
            return Err(BackslideError::not_writable(
                change.key().name(),
                "settings store is read-only",
            ));
        }
        inner.data.apply(change);
        Ok(())
    }
}
