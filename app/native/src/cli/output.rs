//! CLI output formatting utilities.
//!
//! Human-readable renderings of the daemon status and the image list. Every
//! command also offers `--json` for scripts.

use std::fmt::Write as _;

use colored::Colorize;

use crate::ipc::StatusReport;

/// Prints a value as pretty JSON.
pub fn print_json(value: &impl serde::Serialize) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{json}");
}

/// Formats a number of seconds as a short duration, e.g. `12m 05s`.
#[must_use]
pub fn format_remaining(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats the daemon status as aligned `label: value` lines.
#[must_use]
pub fn format_status(status: &StatusReport) -> String {
    let state = if status.running {
        let next = status
            .remaining_secs
            .map(|secs| format!(" (next change in {})", format_remaining(secs)))
            .unwrap_or_default();
        format!("{}{next}", "running".green())
    } else {
        format!("{} ({} min waited)", "paused".yellow(), status.elapsed)
    };

    let none = || "none".dimmed().to_string();
    let rows = [
        ("State", state),
        ("Delay", format!("{} min", status.delay)),
        ("Order", status.mode.clone()),
        ("Current", status.current.clone().unwrap_or_else(none)),
        ("Up next", status.preview.clone().unwrap_or_else(none)),
        ("Queued", status.queued.to_string()),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{:<9}{value}", format!("{label}:").bold());
    }
    out
}

/// Formats the outcome of `next`: the wallpaper now shown and the one after it.
#[must_use]
pub fn format_next(status: &StatusReport) -> String {
    let Some(current) = &status.current else {
        return String::new();
    };

    match &status.preview {
        Some(preview) => format!("{current}\n{} {preview}\n", "Up next:".dimmed()),
        None => format!("{current}\n"),
    }
}

/// Formats the image list with 1-based positions.
#[must_use]
pub fn format_image_list(images: &[String]) -> String {
    if images.is_empty() {
        return "No wallpapers configured. Add some with `backslide add <PATH>`.\n".to_string();
    }

    let width = images.len().to_string().len();
    let mut out = String::new();
    for (index, path) in images.iter().enumerate() {
        let position = format!("{:>width$}", index + 1);
        let _ = writeln!(out, "{}  {path}", position.cyan());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() { colored::control::set_override(false); }

    fn status(running: bool) -> StatusReport {
        StatusReport {
            running,
            delay: 20,
            elapsed: 5,
            remaining_secs: running.then_some(754),
            mode: "random".to_string(),
            current: Some("/walls/a.jpg".to_string()),
            preview: None,
            queued: 3,
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(42), "42s");
        assert_eq!(format_remaining(754), "12m 34s");
        assert_eq!(format_remaining(3 * 3600 + 5 * 60), "3h 05m");
    }

    #[test]
    fn test_format_status_running() {
        plain();
        let out = format_status(&status(true));
        assert!(out.contains("running (next change in 12m 34s)"));
        assert!(out.contains("/walls/a.jpg"));
        assert!(out.contains("Up next: none"));
    }

    #[test]
    fn test_format_status_paused() {
        plain();
        let out = format_status(&status(false));
        assert!(out.contains("paused (5 min waited)"));
        assert!(!out.contains("next change"));
    }

    #[test]
    fn test_format_next_prints_new_wallpaper() {
        plain();
        let mut report = status(true);
        report.preview = Some("/walls/b.jpg".to_string());

        assert_eq!(format_next(&report), "/walls/a.jpg\nUp next: /walls/b.jpg\n");
    }

    #[test]
    fn test_format_next_without_preview() {
        assert_eq!(format_next(&status(true)), "/walls/a.jpg\n");

        let mut report = status(true);
        report.current = None;
        assert!(format_next(&report).is_empty());
    }

    #[test]
    fn test_format_image_list_positions() {
        plain();
        let images: Vec<String> = (1..=10).map(|i| format!("/walls/{i}.jpg")).collect();
        let out = format_image_list(&images);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], " 1  /walls/1.jpg");
        assert_eq!(lines[9], "10  /walls/10.jpg");
    }

    #[test]
    fn test_format_image_list_empty() {
        assert!(format_image_list(&[]).contains("No wallpapers configured"));
    }
}
