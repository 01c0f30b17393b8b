//! Shared terminal formatting helpers.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use tripmate_types::error::{HttpError, RoomError};

/// A steady-ticking spinner with `message`.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Local date and time, or `-` when unknown.
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Local clock time for chat lines.
pub fn format_clock(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Shorten `text` to at most `max` characters, appending `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub fn print_success(message: &str) {
    println!();
    println!("  {} {message}", style("✓").green().bold());
    println!();
}

pub fn print_info(message: &str) {
    println!();
    println!("  {} {message}", style("i").blue().bold());
    println!();
}

/// Wrap a REST failure with the user-facing hint as the top-level message.
pub fn http_failure(error: HttpError) -> anyhow::Error {
    let hint = error.hint();
    anyhow::Error::new(error).context(hint)
}

pub fn room_failure(error: RoomError) -> anyhow::Error {
    match error {
        RoomError::Http(e) => http_failure(e),
        other => anyhow::Error::new(other),
    }
}
