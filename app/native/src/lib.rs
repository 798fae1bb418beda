//! BackSlide - a desktop wallpaper slideshow.
//!
//! The rotation core is two cooperating parts driven by one event loop:
//!
//! - [`wallpaper::QueueManager`] decides which image comes next, either in
//!   list order or shuffled without immediate repeats.
//! - [`timer::IntervalTimer`] fires every `delay` minutes and remembers the
//!   minutes already waited, so a paused or restarted rotation resumes
//!   mid-interval.
//!
//! Both read their configuration from [`settings::Settings`], which persists
//! to a JSON file and notifies subscribers when a key changes. The
//! [`daemon`] wires everything together and serves the [`cli`] remote over a
//! Unix socket.

pub mod cli;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod ipc;
pub mod platform;
pub mod schema;
pub mod settings;
pub mod timer;
pub mod wallpaper;
