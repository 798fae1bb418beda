//! CLI module for BackSlide.
//!
//! `backslide daemon` runs the rotation loop. Commands that control the
//! rotation talk to the daemon over its socket; commands that edit the
//! wallpaper list or the timing write the settings file, which the daemon
//! watches.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::BackslideError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), BackslideError> {
    let cli = Cli::parse();
    cli.execute()
}
