//! The BackSlide daemon.
//!
//! One [`Context`] owns the settings store, the queue manager and the interval
//! timer. Everything that can happen to them (timer ticks, settings changes,
//! file edits, CLI requests) arrives as an [`Event`] on a single channel and is
//! handled on the daemon's only thread, so the core never needs locks.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, oneshot};

use crate::error::BackslideError;
use crate::ipc::{IpcRequest, IpcResponse, IpcServer, StatusReport};
use crate::settings::{Key, SettingChange, Settings, watch_settings_file};
use crate::timer::{DeadlineScheduler, IntervalTimer, Scheduler, WakeHandle};
use crate::wallpaper::{OrderMode, QueueManager, WallpaperApplier};

/// Something the daemon loop has to handle.
#[derive(Debug)]
pub enum Event {
    /// The timer completed an interval.
    Tick,
    /// A bound setting changed.
    SettingChanged(SettingChange),
    /// The settings file was modified on disk.
    SettingsFileChanged,
    /// A CLI request, answered through the sender.
    Request(IpcRequest, oneshot::Sender<IpcResponse>),
}

/// Daemon startup options.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Settings file to load and watch.
    pub settings_path: PathBuf,
    /// Socket to serve CLI requests on.
    pub socket_path: PathBuf,
    /// Change the wallpaper once right away instead of waiting for the first interval.
    pub apply_now: bool,
}

/// The state owned by the daemon loop.
pub struct Context<S: Scheduler> {
    settings: Rc<Settings>,
    queue: QueueManager,
    timer: IntervalTimer<S>,
}

impl<S: Scheduler> Context<S> {
    /// Wires the queue, the timer and the settings bindings to `events`.
    pub fn new(
        settings: Rc<Settings>,
        applier: Box<dyn WallpaperApplier>,
        scheduler: S,
        events: &mpsc::UnboundedSender<Event>,
    ) -> Self {
        let mut queue = QueueManager::new(Rc::clone(&settings), applier);
        queue.set_preview_callback(|head| match head {
            Some(path) => tracing::info!(path, "up next"),
            None => tracing::info!("up next: nothing, the image list is empty"),
        });

        let mut timer = IntervalTimer::new(Rc::clone(&settings), scheduler);
        let tx = events.clone();
        timer.set_callback(move || {
            let _ = tx.send(Event::Tick);
        });

        // Changes are queued rather than handled inline: reload() runs while
        // the context is already borrowed by the loop
        for key in [Key::Delay, Key::Random, Key::ImageList] {
            let tx = events.clone();
            settings.bind_key(key, move |change| {
                let _ = tx.send(Event::SettingChanged(change.clone()));
            });
        }

        Self { settings, queue, timer }
    }

    /// Starts the timer, optionally changing the wallpaper first.
    pub fn start(&mut self, apply_now: bool) {
        if apply_now {
            let _ = self.advance();
        }
        self.timer.begin();
        tracing::info!(
            delay = self.timer.delay(),
            elapsed = self.timer.elapsed_minutes(),
            mode = %self.queue.mode(),
            "slideshow started"
        );
    }

    /// Stops the timer so the minutes waited are persisted.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.timer.stop() {
            tracing::warn!(error = %err, "failed to persist elapsed time");
        }
        tracing::info!(elapsed = self.timer.elapsed_minutes(), "slideshow stopped");
    }

    /// Handles one event.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Tick => {
                let _ = self.advance();
            }
            Event::SettingChanged(change) => self.on_setting_changed(&change),
            Event::SettingsFileChanged => {
                if let Err(err) = self.settings.reload() {
                    tracing::warn!(error = %err, "failed to reload settings, keeping previous values");
                }
            }
            Event::Request(request, reply) => {
                let response = self.handle_request(&request);
                if reply.send(response).is_err() {
                    tracing::debug!(?request, "client went away before the reply");
                }
            }
        }
    }

    /// Handles every event already queued on `events`.
    pub fn handle_pending(&mut self, events: &mut mpsc::UnboundedReceiver<Event>) {
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
        }
    }

    /// Delivers due scheduler wakes to the timer.
    pub fn wake(&mut self, handles: Vec<WakeHandle>) {
        for handle in handles {
            if let Err(err) = self.timer.on_wake(handle) {
                tracing::warn!(error = %err, "timer wake failed");
            }
        }
    }

    /// Answers a CLI request.
    pub fn handle_request(&mut self, request: &IpcRequest) -> IpcResponse {
        tracing::debug!(?request, "ipc request");

        match request {
            IpcRequest::Ping => IpcResponse::success("pong"),
            IpcRequest::Next => match self.next() {
                Ok(()) => IpcResponse::success(self.status()),
                Err(err) => IpcResponse::error(err.to_string()),
            },
            IpcRequest::Pause => match self.timer.stop() {
                Ok(()) => IpcResponse::success(self.status()),
                Err(err) => IpcResponse::error(err.to_string()),
            },
            IpcRequest::Resume => {
                self.timer.begin();
                IpcResponse::success(self.status())
            }
            IpcRequest::Shuffle => {
                self.queue.set_random();
                if let Err(err) = self.settings.set_random(true) {
                    tracing::warn!(error = %err, "failed to persist random order");
                }
                IpcResponse::success(self.status())
            }
            IpcRequest::Status => IpcResponse::success(self.status()),
        }
    }

    /// Shows the next wallpaper now and starts a fresh interval.
    ///
    /// # Errors
    ///
    /// Returns the queue's error; the timer is left alone in that case.
    pub fn next(&mut self) -> Result<(), BackslideError> {
        self.advance()?;

        if let Err(err) = self.timer.reset_elapsed() {
            tracing::warn!(error = %err, "failed to reset elapsed time");
        }
        Ok(())
    }

    /// Reports the current state.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        StatusReport {
            running: self.timer.is_running(),
            delay: self.timer.delay(),
            elapsed: self.timer.elapsed_minutes(),
            remaining_secs: self.timer.remaining().map(|remaining| remaining.as_secs()),
            mode: self.queue.mode().to_string(),
            current: self.queue.current().map(String::from),
            preview: self.queue.preview().map(String::from),
            queued: self.queue.len(),
        }
    }

    #[must_use]
    pub const fn queue(&self) -> &QueueManager { &self.queue }

    #[must_use]
    pub const fn timer(&self) -> &IntervalTimer<S> { &self.timer }

    pub const fn timer_mut(&mut self) -> &mut IntervalTimer<S> { &mut self.timer }

    /// Advances the queue, pruning paths the applier could not show.
    fn advance(&mut self) -> Result<String, BackslideError> {
        let result = self.queue.advance();

        match &result {
            Ok(_) => {}
            Err(BackslideError::ApplyFailed { path, reason }) => {
                tracing::warn!(path = %path, reason = %reason, "removing unusable wallpaper");
                if let Err(err) = self.settings.remove_image(path) {
                    tracing::warn!(error = %err, "failed to remove wallpaper from the image list");
                }
            }
            Err(BackslideError::EmptySource) => {
                tracing::warn!("no wallpapers configured, add some with `backslide add`");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to change wallpaper");
            }
        }
        result
    }

    fn on_setting_changed(&mut self, change: &SettingChange) {
        match change {
            SettingChange::Delay(minutes) => {
                if let Err(err) = self.timer.on_delay_changed(*minutes) {
                    tracing::warn!(error = %err, "failed to restart timer");
                }
            }
            SettingChange::Random(random) => self.queue.set_mode(OrderMode::from_random(*random)),
            SettingChange::ImageList(_) => self.queue.sync_source(),
            SettingChange::ElapsedTime(_) => {}
        }
    }
}

/// Runs the daemon until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded, the IPC socket cannot
/// be bound, or the runtime cannot be created.
pub fn run(options: &DaemonOptions, applier: Box<dyn WallpaperApplier>) -> Result<(), BackslideError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async {
        let settings = Rc::new(Settings::from_file(options.settings_path.clone())?);
        tracing::info!(
            path = %options.settings_path.display(),
            images = settings.image_list().len(),
            applier = applier.name(),
            "settings loaded"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let mut ctx = Context::new(settings, applier, DeadlineScheduler::new(), &tx);

        let watch_tx = tx.clone();
        watch_settings_file(&options.settings_path, move || {
            let _ = watch_tx.send(Event::SettingsFileChanged);
        });

        let ipc_tx = tx.clone();
        let server = IpcServer::start(&options.socket_path, move |request| {
            let (reply_tx, reply_rx) = oneshot::channel();
            if ipc_tx.send(Event::Request(request, reply_tx)).is_err() {
                return IpcResponse::error("daemon is shutting down");
            }
            reply_rx
                .blocking_recv()
                .unwrap_or_else(|_| IpcResponse::error("daemon is shutting down"))
        })?;
        drop(tx);

        ctx.start(options.apply_now);
        let result = event_loop(&mut ctx, rx).await;
        ctx.shutdown();
        server.stop();
        result
    })
}

async fn event_loop(
    ctx: &mut Context<DeadlineScheduler>,
    mut events: mpsc::UnboundedReceiver<Event>,
) -> Result<(), BackslideError> {
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        let deadline = ctx.timer().scheduler().next_deadline();

        tokio::select! {
            () = sleep_until_deadline(deadline) => {
                let due = ctx.timer_mut().scheduler_mut().take_due(Instant::now());
                ctx.wake(due);
            }
            Some(event) = events.recv() => ctx.handle_event(event),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("terminated, shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
