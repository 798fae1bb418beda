//! Integration tests for the wallpaper rotation.
//!
//! Drives a daemon [`Context`] against a real settings file in a temporary
//! directory. Time is virtual: the manual scheduler only moves when a test
//! advances it, so a 20 minute interval passes instantly.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use backslide_lib::daemon::{Context, Event};
use backslide_lib::error::BackslideError;
use backslide_lib::ipc::{IpcRequest, StatusReport};
use backslide_lib::settings::Settings;
use backslide_lib::timer::ManualScheduler;
use backslide_lib::wallpaper::WallpaperApplier;
use tokio::sync::mpsc;

const MINUTE: Duration = Duration::from_secs(60);

// ============================================================================
// Helpers
// ============================================================================

/// Records applied paths and rejects anything under `/broken/`.
struct RecordingApplier {
    applied: Rc<RefCell<Vec<String>>>,
}

impl WallpaperApplier for RecordingApplier {
    fn apply(&mut self, path: &str) -> Result<(), BackslideError> {
        if path.starts_with("/broken/") {
            return Err(BackslideError::apply_failed(path, "not an image"));
        }
        self.applied.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str { "recording" }
}

struct Daemon {
    ctx: Context<ManualScheduler>,
    events: mpsc::UnboundedReceiver<Event>,
    applied: Rc<RefCell<Vec<String>>>,
    settings: Rc<Settings>,
}

impl Daemon {
    fn open(path: &Path) -> Self {
        let settings = Rc::new(Settings::from_file(path.to_path_buf()).unwrap());
        let applied = Rc::new(RefCell::new(Vec::new()));
        let applier = RecordingApplier { applied: Rc::clone(&applied) };

        let (tx, events) = mpsc::unbounded_channel();
        let ctx = Context::new(Rc::clone(&settings), Box::new(applier), ManualScheduler::new(), &tx);

        Self { ctx, events, applied, settings }
    }

    /// Moves virtual time forward and handles everything that fired.
    fn pass(&mut self, by: Duration) {
        let due = self.ctx.timer_mut().scheduler_mut().advance(by);
        self.ctx.wake(due);
        self.ctx.handle_pending(&mut self.events);
    }

    fn file_changed(&mut self) {
        self.ctx.handle_event(Event::SettingsFileChanged);
        self.ctx.handle_pending(&mut self.events);
    }

    fn applied(&self) -> Vec<String> { self.applied.borrow().clone() }
}

fn write_settings(path: &Path, json: &serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(json).unwrap()).unwrap();
}

fn settings_file(dir: &Path) -> PathBuf {
    let path = dir.join("settings.json");
    write_settings(
        &path,
        &serde_json::json!({
            "delay": 5,
            "random": false,
            "image-list": ["/w/a.jpg", "/w/b.jpg", "/w/c.jpg"],
        }),
    );
    path
}

fn stored(path: &Path) -> Settings { Settings::from_file(path.to_path_buf()).unwrap() }

// ============================================================================
// Rotation
// ============================================================================

#[test]
fn test_sequential_rotation_follows_the_list() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = Daemon::open(&settings_file(dir.path()));
    daemon.ctx.start(false);

    daemon.pass(4 * MINUTE);
    assert!(daemon.applied().is_empty());

    daemon.pass(MINUTE);
    daemon.pass(5 * MINUTE);
    daemon.pass(5 * MINUTE);
    daemon.pass(5 * MINUTE);

    assert_eq!(daemon.applied(), vec!["/w/a.jpg", "/w/b.jpg", "/w/c.jpg", "/w/a.jpg"]);
}

#[test]
fn test_apply_now_changes_wallpaper_at_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = Daemon::open(&settings_file(dir.path()));
    daemon.ctx.start(true);

    assert_eq!(daemon.applied(), vec!["/w/a.jpg"]);
    assert_eq!(daemon.ctx.timer().remaining(), Some(5 * MINUTE));
}

#[test]
fn test_random_rotation_shows_every_image_once_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let images: Vec<String> = (0..6).map(|i| format!("/w/{i}.jpg")).collect();
    write_settings(&path, &serde_json::json!({ "delay": 2, "image-list": images }));

    let mut daemon = Daemon::open(&path);
    daemon.ctx.start(false);
    for _ in 0..6 {
        daemon.pass(2 * MINUTE);
    }

    let mut applied = daemon.applied();
    applied.sort();
    assert_eq!(applied, images);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_elapsed_time_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());

    let mut first = Daemon::open(&path);
    first.ctx.start(false);
    first.pass(5 * MINUTE);
    first.pass(3 * MINUTE);
    first.ctx.shutdown();
    assert_eq!(stored(&path).elapsed_time(), 3);
    drop(first);

    let mut second = Daemon::open(&path);
    second.ctx.start(false);
    assert_eq!(second.ctx.timer().remaining(), Some(2 * MINUTE));

    second.pass(2 * MINUTE);
    assert_eq!(second.applied().len(), 1);
    assert_eq!(stored(&path).elapsed_time(), 0);
}

#[test]
fn test_unusable_wallpaper_is_pruned_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    write_settings(
        &path,
        &serde_json::json!({
            "random": false,
            "image-list": ["/broken/x.jpg", "/w/a.jpg"],
        }),
    );

    let mut daemon = Daemon::open(&path);
    let result = daemon.ctx.next();

    assert!(matches!(
        result,
        Err(BackslideError::ApplyFailed { ref path, .. }) if path == "/broken/x.jpg"
    ));
    assert_eq!(stored(&path).image_list(), vec!["/w/a.jpg"]);

    daemon.ctx.next().unwrap();
    assert_eq!(daemon.applied(), vec!["/w/a.jpg"]);
}

// ============================================================================
// External edits
// ============================================================================

#[test]
fn test_delay_edit_restarts_running_timer() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());
    let mut daemon = Daemon::open(&path);
    daemon.ctx.start(false);
    daemon.pass(3 * MINUTE);

    write_settings(
        &path,
        &serde_json::json!({
            "delay": 10,
            "random": false,
            "image-list": ["/w/a.jpg", "/w/b.jpg", "/w/c.jpg"],
        }),
    );
    daemon.file_changed();

    assert_eq!(daemon.settings.delay(), 10);
    assert_eq!(daemon.ctx.timer().remaining(), Some(10 * MINUTE));
}

#[test]
fn test_removed_image_leaves_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());
    let mut daemon = Daemon::open(&path);
    assert_eq!(daemon.ctx.queue().preview(), Some("/w/a.jpg"));

    write_settings(
        &path,
        &serde_json::json!({
            "delay": 5,
            "random": false,
            "image-list": ["/w/b.jpg", "/w/c.jpg"],
        }),
    );
    daemon.file_changed();

    assert_eq!(daemon.ctx.queue().preview(), Some("/w/b.jpg"));
}

#[test]
fn test_invalid_edit_keeps_previous_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());
    let mut daemon = Daemon::open(&path);

    fs::write(&path, "{ not json").unwrap();
    daemon.file_changed();

    assert_eq!(daemon.settings.delay(), 5);
    assert_eq!(daemon.settings.image_list().len(), 3);
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_pause_and_resume_through_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());
    let mut daemon = Daemon::open(&path);
    daemon.ctx.start(false);
    daemon.pass(2 * MINUTE);

    let paused = daemon.ctx.handle_request(&IpcRequest::Pause).into_result().unwrap();
    let paused: StatusReport = serde_json::from_value(paused).unwrap();
    assert!(!paused.running);
    assert_eq!(paused.elapsed, 2);
    assert_eq!(stored(&path).elapsed_time(), 2);

    // Time spent paused does not count
    daemon.pass(30 * MINUTE);
    assert!(daemon.applied().is_empty());

    daemon.ctx.handle_request(&IpcRequest::Resume).into_result().unwrap();
    daemon.pass(3 * MINUTE);
    assert_eq!(daemon.applied(), vec!["/w/a.jpg"]);
}

#[test]
fn test_shuffle_request_persists_random_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = settings_file(dir.path());
    let mut daemon = Daemon::open(&path);

    let status = daemon.ctx.handle_request(&IpcRequest::Shuffle).into_result().unwrap();
    let status: StatusReport = serde_json::from_value(status).unwrap();

    assert_eq!(status.mode, "random");
    assert_eq!(status.queued, 3);
    assert!(stored(&path).is_random());
}
