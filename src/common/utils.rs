//! Formatting helpers shared by the progress output and the report

use chrono::{DateTime, Local};

/// Day-first local time with milliseconds, e.g. `05.09.2025, 14:03:27.418`
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M:%S%.3f";

pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats an optional timestamp, `-` when unset
pub fn format_optional_timestamp(timestamp: Option<DateTime<Local>>) -> String {
    timestamp
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string())
}

/// Width of a cell in terminal columns, counting characters rather than bytes
pub fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Left-align `text` in a column of `width` characters
pub fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(fill))
}
