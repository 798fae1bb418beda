//! CLI command definitions using Clap.
//!
//! Commands fall into three groups:
//!
//! - `daemon` runs the rotation loop in the foreground
//! - `next`, `pause`, `resume`, `shuffle` and `status` talk to a running daemon
//! - `order`, `delay`, `list`, `add`, `remove` and `move` edit the settings file
//!
//! Shared argument types live in [`types`]; list editing lives in [`images`].

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::cli::output;
use crate::constants::{APP_VERSION, SETTINGS_ENV_VAR};
use crate::daemon::{self, DaemonOptions};
use crate::error::BackslideError;
use crate::ipc::{IpcRequest, StatusReport, send_request};
use crate::platform::path::{default_settings_path, socket_path};
use crate::schema;
use crate::settings::{Settings, parse_delay};
use crate::wallpaper::OrderMode;

pub mod images;
pub mod types;

pub use types::{Backend, Order, Position};

/// BackSlide - rotate the desktop wallpaper on a timer.
#[derive(Parser, Debug)]
#[command(name = "backslide")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    ///
    /// Defaults to `$XDG_CONFIG_HOME/backslide/settings.json`. The file may
    /// contain comments.
    #[arg(long, global = true, value_name = "PATH", env = SETTINGS_ENV_VAR)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the wallpaper rotation in the foreground.
    ///
    /// Changes the wallpaper every `delay` minutes, follows edits to the
    /// settings file and answers the other commands over a local socket.
    Daemon {
        /// How to set the desktop background.
        #[arg(long, short, value_enum, default_value_t = Backend::Desktop)]
        backend: Backend,

        /// Change the wallpaper once on startup.
        #[arg(long)]
        apply_now: bool,
    },

    /// Show the next wallpaper now and restart the interval.
    Next,

    /// Pause the rotation, remembering the minutes already waited.
    Pause,

    /// Resume a paused rotation.
    Resume,

    /// Reshuffle the remaining wallpapers and switch to random order.
    Shuffle,

    /// Show the daemon state.
    Status {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Set the wallpaper order.
    Order {
        /// `random` or `sequential`.
        #[arg(value_enum)]
        order: Order,
    },

    /// Set the minutes between two wallpaper changes (at least 2).
    Delay {
        /// Whole minutes.
        minutes: String,
    },

    /// List the configured wallpapers.
    List {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Add wallpapers. Folders are scanned recursively for images.
    Add {
        /// Image files or folders.
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,
    },

    /// Remove wallpapers by path or by position (as shown by `list`).
    Remove {
        /// Paths or 1-based positions.
        #[arg(required = true, value_name = "PATH|POSITION")]
        targets: Vec<String>,
    },

    /// Move a wallpaper to another position in the list.
    Move {
        /// Current 1-based position.
        from: Position,
        /// New 1-based position.
        to: Position,
    },

    /// Output the settings file JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(backslide completions --shell zsh)"
    ///   backslide completions --shell fish > ~/.config/fish/completions/backslide.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the settings file in use.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), BackslideError> {
        match &self.command {
            Commands::Daemon { backend, apply_now } => {
                let options = DaemonOptions {
                    settings_path: self.settings_path(),
                    socket_path: socket_path(),
                    apply_now: *apply_now,
                };
                daemon::run(&options, backend.applier())?;
            }
            Commands::Next => {
                let status = Self::request_status(&IpcRequest::Next)?;
                print!("{}", output::format_next(&status));
            }
            Commands::Pause => {
                Self::request(&IpcRequest::Pause)?;
            }
            Commands::Resume => {
                Self::request(&IpcRequest::Resume)?;
            }
            Commands::Shuffle => {
                Self::request(&IpcRequest::Shuffle)?;
            }
            Commands::Status { json } => {
                let status = Self::request_status(&IpcRequest::Status)?;
                if *json {
                    output::print_json(&status);
                } else {
                    print!("{}", output::format_status(&status));
                }
            }
            Commands::Order { order } => {
                let settings = self.open_settings()?;
                settings.set_random(OrderMode::from(*order) == OrderMode::Random)?;
            }
            Commands::Delay { minutes } => {
                let minutes = parse_delay(minutes)?;
                self.open_settings()?.set_delay(minutes)?;
            }
            Commands::List { json } => {
                let list = self.open_settings()?.image_list();
                if *json {
                    output::print_json(&list);
                } else {
                    print!("{}", output::format_image_list(&list));
                }
            }
            Commands::Add { paths } => {
                let settings = self.open_settings()?;
                let added = images::add(&settings, paths, &std::env::current_dir()?)?;
                println!("Added {added} wallpaper(s).");
            }
            Commands::Remove { targets } => {
                let settings = self.open_settings()?;
                for path in images::remove(&settings, targets, &std::env::current_dir()?)? {
                    println!("Removed {path}");
                }
            }
            Commands::Move { from, to } => {
                images::move_entry(&self.open_settings()?, *from, *to)?;
            }
            Commands::Schema => {
                println!("{}", schema::generate_schema_json());
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
            }
        }

        Ok(())
    }

    fn open_settings(&self) -> Result<Settings, BackslideError> {
        Settings::from_file(self.settings_path())
    }

    fn request(request: &IpcRequest) -> Result<serde_json::Value, BackslideError> {
        send_request(&socket_path(), request)?.into_result()
    }

    fn request_status(request: &IpcRequest) -> Result<StatusReport, BackslideError> {
        Ok(serde_json::from_value(Self::request(request)?)?)
    }

    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        let name = cmd.get_name().to_string();
        generate(generator, &mut cmd, name, &mut io::stdout());
    }
}
