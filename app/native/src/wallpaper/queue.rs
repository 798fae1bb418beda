//! Wallpaper queue manager.
//!
//! Decides which wallpaper becomes current next. The queue is FIFO: refills
//! append a fresh copy of the image list (shuffled in random mode) behind
//! whatever is still queued, and `advance` pops from the front. At least one
//! item stays queued after every advance while the list is non-empty, so the
//! upcoming wallpaper can always be previewed.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use super::applier::WallpaperApplier;
use super::shuffle::{avoid_repeat, shuffle};
use crate::error::BackslideError;
use crate::platform::path::expand;
use crate::settings::Settings;

/// Ordering policy for refills and reshuffles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    Sequential,
    Random,
}

impl OrderMode {
    /// Maps the `random` setting to a mode.
    #[must_use]
    pub const fn from_random(random: bool) -> Self {
        if random { Self::Random } else { Self::Sequential }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Random => f.write_str("random"),
        }
    }
}

type PreviewCallback = Box<dyn FnMut(Option<&str>)>;

/// Owns the presentation order of the wallpapers.
pub struct QueueManager {
    queue: VecDeque<String>,
    mode: OrderMode,
    settings: Rc<Settings>,
    applier: Box<dyn WallpaperApplier>,
    rng: StdRng,
    current: Option<String>,
    preview: Option<PreviewCallback>,
}

impl fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueManager")
            .field("queue", &self.queue)
            .field("mode", &self.mode)
            .field("current", &self.current)
            .field("applier", &self.applier.name())
            .finish_non_exhaustive()
    }
}

impl QueueManager {
    /// Creates a queue over the settings image list, filled and ordered
    /// according to the `random` setting.
    #[must_use]
    pub fn new(settings: Rc<Settings>, applier: Box<dyn WallpaperApplier>) -> Self {
        Self::with_rng(settings, applier, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a queue using `rng` for shuffling.
    #[must_use]
    pub fn with_rng(
        settings: Rc<Settings>,
        applier: Box<dyn WallpaperApplier>,
        rng: StdRng,
    ) -> Self {
        let mode = OrderMode::from_random(settings.is_random());
        let mut manager = Self {
            queue: VecDeque::new(),
            mode,
            settings,
            applier,
            rng,
            current: None,
            preview: None,
        };
        manager.refill();
        manager
    }

    /// Pops the next wallpaper and applies it.
    ///
    /// Refills first when fewer than two items are queued. A path the applier
    /// rejects is not queued again; the caller decides whether to prune it from
    /// the image list.
    ///
    /// # Errors
    ///
    /// Returns `EmptySource` if the image list is empty, or the applier's
    /// `ApplyFailed`/`NotWritable` error.
    pub fn advance(&mut self) -> Result<String, BackslideError> {
        if self.queue.len() < 2 {
            self.refill();
        }

        let Some(path) = self.queue.pop_front() else {
            self.emit_preview();
            return Err(BackslideError::EmptySource);
        };

        let result = self.applier.apply(&expand(&path).to_string_lossy());
        self.emit_preview();

        // Report the entry as listed, not its expanded form, so callers can prune it
        if let Err(err) = result {
            return Err(match err {
                BackslideError::ApplyFailed { reason, .. } => {
                    BackslideError::apply_failed(path, reason)
                }
                other => other,
            });
        }

        tracing::info!(path = %path, applier = self.applier.name(), "wallpaper changed");
        self.current = Some(path.clone());
        Ok(path)
    }

    /// Switches to sequential mode and reloads the image list in order.
    pub fn set_sequential(&mut self) {
        self.mode = OrderMode::Sequential;
        self.queue.clear();
        self.refill();
        self.emit_preview();
    }

    /// Switches to random mode.
    ///
    /// Already in random mode, the remaining queue is reshuffled in place.
    /// Coming from sequential mode, the queue is reloaded shuffled.
    pub fn set_random(&mut self) {
        if self.mode == OrderMode::Random {
            let queued = self.queue.make_contiguous();
            shuffle(queued, &mut self.rng);
            avoid_repeat(queued, self.current.as_ref());
        } else {
            self.mode = OrderMode::Random;
            self.queue.clear();
            self.refill();
        }
        self.emit_preview();
    }

    /// Switches to `mode` unless it is already active.
    pub fn set_mode(&mut self, mode: OrderMode) {
        if mode == self.mode {
            return;
        }

        match mode {
            OrderMode::Sequential => self.set_sequential(),
            OrderMode::Random => self.set_random(),
        }
    }

    /// Registers the preview callback and calls it with the upcoming wallpaper.
    pub fn set_preview_callback<F>(&mut self, callback: F)
    where F: FnMut(Option<&str>) + 'static {
        if self.queue.is_empty() {
            self.refill();
        }
        self.preview = Some(Box::new(callback));
        self.emit_preview();
    }

    /// Drops queued paths that are no longer in the image list.
    pub fn sync_source(&mut self) {
        let source = self.settings.image_list();
        let head = self.queue.front().cloned();
        self.queue.retain(|path| source.contains(path));

        if self.queue.front() != head.as_ref() {
            self.emit_preview();
        }
    }

    /// Current ordering policy.
    #[must_use]
    pub const fn mode(&self) -> OrderMode { self.mode }

    /// The wallpaper applied by the last successful advance.
    #[must_use]
    pub fn current(&self) -> Option<&str> { self.current.as_deref() }

    /// The wallpaper the next advance will apply.
    #[must_use]
    pub fn preview(&self) -> Option<&str> { self.queue.front().map(String::as_str) }

    /// Number of queued wallpapers.
    #[must_use]
    pub fn len(&self) -> usize { self.queue.len() }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    /// Appends a fresh copy of the image list to the queue.
    fn refill(&mut self) {
        let mut batch = self.settings.image_list();
        if batch.is_empty() {
            return;
        }

        if self.mode == OrderMode::Random {
            shuffle(&mut batch, &mut self.rng);
            let last = self.queue.back().or(self.current.as_ref());
            avoid_repeat(&mut batch, last);
        }

        tracing::debug!(count = batch.len(), mode = %self.mode, "queue refilled");
        self.queue.extend(batch);
    }

    fn emit_preview(&mut self) {
        if let Some(callback) = self.preview.as_mut() {
            callback(self.queue.front().map(String::as_str));
        }
    }
}
