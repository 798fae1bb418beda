#![allow(clippy::multiple_crate_versions)]

//! BackSlide - desktop wallpaper slideshow.
//!
//! `backslide daemon` runs the slideshow; every other subcommand is a remote
//! for a running daemon or an editor for the settings file.

use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so command output stays scriptable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = backslide_lib::cli::run() {
        eprintln!("backslide: {err}");
        std::process::exit(1);
    }
}
