//! Report view
//!
//! Read-only rendering of loaded rows and run state: a table coloured by each row's
//! outcome, a summary panel, and a JSON export of the whole run.

use crate::batch::{RowStatus, RunState};
use crate::common::utils::{display_width, format_optional_timestamp, format_timestamp, pad_right};
use crate::error::Result;
use crate::records::{FIELD_PASSWORD, RowRecord};
use serde::Serialize;
use std::path::Path;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const MASK: &str = "******";

#[derive(Serialize)]
struct ReportDocument<'a> {
    progress: f64,
    succeeded: usize,
    failed: usize,
    #[serde(flatten)]
    state: &'a RunState,
}

pub struct ReportView<'a> {
    rows: &'a [RowRecord],
    state: &'a RunState,
    color: bool,
}

impl<'a> ReportView<'a> {
    pub fn new(rows: &'a [RowRecord], state: &'a RunState) -> Self {
        Self {
            rows,
            state,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Table of input rows; columns follow the first row's headers
    pub fn render_table(&self) -> String {
        let Some(first) = self.rows.first() else {
            return "(No rows loaded)".to_string();
        };

        let mut headers: Vec<String> = vec!["#".to_string()];
        headers.extend(first.headers().map(str::to_string));
        headers.push("status".to_string());

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut cells = vec![(index + 1).to_string()];
                cells.extend(first.headers().map(|h| {
                    if h == FIELD_PASSWORD && !row.field(h).is_empty() {
                        MASK.to_string()
                    } else {
                        row.field(h).to_string()
                    }
                }));
                cells.push(
                    self.state
                        .status_of(index)
                        .map(|s| s.label().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
                cells
            })
            .collect();

        let widths: Vec<usize> = (0..headers.len())
            .map(|col| {
                body.iter()
                    .map(|cells| display_width(&cells[col]))
                    .chain(std::iter::once(display_width(&headers[col])))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let join = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad_right(cell, *width))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut lines = vec![join(&headers)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for (index, cells) in body.iter().enumerate() {
            let line = join(cells);
            lines.push(match self.row_color(index) {
                Some(color) => format!("{}{}{}", color, line, RESET),
                None => line,
            });
        }
        lines.join("\n")
    }

    fn row_color(&self, index: usize) -> Option<&'static str> {
        if !self.color {
            return None;
        }
        match self.state.status_of(index)? {
            RowStatus::Success => Some(GREEN),
            RowStatus::AuthError | RowStatus::RegistrationError => Some(RED),
        }
    }

    /// Key/value lines of the summary panel
    pub fn summary_items(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Started", format_optional_timestamp(self.state.started_at())),
            ("Finished", format_optional_timestamp(self.state.finished_at())),
            (
                "Registered",
                format!("{} / {}", self.state.success_count(), self.rows.len()),
            ),
            ("Failed", self.state.failure_count().to_string()),
        ]
    }

    /// One line per failed row: `name (login) — status — time`, plus the cause
    pub fn failure_lines(&self) -> Vec<String> {
        self.state
            .failures()
            .map(|entry| {
                let mut line = format!(
                    "{} ({}) — {} — {}",
                    entry.child_name,
                    entry.login,
                    entry.status,
                    format_timestamp(&entry.timestamp)
                );
                if let Some(cause) = entry.cause_description() {
                    line.push_str(&format!(" [{}]", cause));
                }
                line
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        let document = ReportDocument {
            progress: self.state.progress(),
            succeeded: self.state.success_count(),
            failed: self.state.failure_count(),
            state: self.state,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::LogEntry;
    use crate::service::CallFailure;

    fn rows() -> Vec<RowRecord> {
        vec![
            RowRecord::new()
                .with_field("login", "u1")
                .with_field("password", "p1")
                .with_field("childName", "Aruzhan"),
            RowRecord::new()
                .with_field("login", "u2")
                .with_field("password", "p2")
                .with_field("childName", "Timur"),
            RowRecord::new()
                .with_field("login", "u3")
                .with_field("childName", "Dana"),
        ]
    }

    fn state(rows: &[RowRecord]) -> RunState {
        let mut state = RunState::begin(rows.len());
        state.record(LogEntry::new(0, &rows[0], RowStatus::Success, None));
        state.record(LogEntry::new(
            1,
            &rows[1],
            RowStatus::RegistrationError,
            Some(CallFailure::Rejected { status: 409 }),
        ));
        state
    }

    #[test]
    fn test_table_colours_processed_rows_only() {
        let rows = rows();
        let state = state(&rows);
        let table = ReportView::new(&rows, &state).render_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("# | login | password | childName | status"));
        assert!(lines[2].starts_with(GREEN));
        assert!(lines[3].starts_with(RED));
        assert!(!lines[4].contains('\x1b'));
        assert!(lines[4].trim_end().ends_with("| -"));
    }

    #[test]
    fn test_table_masks_passwords_and_can_drop_colour() {
        let rows = rows();
        let state = state(&rows);
        let table = ReportView::new(&rows, &state).with_color(false).render_table();

        assert!(!table.contains("p1"));
        assert!(table.contains(MASK));
        assert!(!table.contains('\x1b'));
    }

    #[test]
    fn test_summary_counts_and_failures() {
        let rows = rows();
        let state = state(&rows);
        let view = ReportView::new(&rows, &state);

        let items = view.summary_items();
        assert_eq!(items[2], ("Registered", "1 / 3".to_string()));
        assert_eq!(items.len(), 4);
        assert_eq!(items[3], ("Failed", "1".to_string()));
        assert_eq!(items[1].1, "-");

        let failures = view.failure_lines();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("Timur (u2) — Registration error — "));
        assert!(failures[0].contains("Already registered"));
    }

    #[test]
    fn test_json_export() {
        let rows = rows();
        let state = state(&rows);
        let json = ReportView::new(&rows, &state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["total_rows"], 3);
        assert_eq!(value["log"][1]["status"], "RegistrationError");
        assert_eq!(value["log"][1]["cause"]["kind"], "rejected");
        assert_eq!(value["log"][1]["cause"]["status"], 409);
        assert!(value["log"][0].get("cause").is_none());
    }

    #[test]
    fn test_empty_input() {
        let state = RunState::default();
        assert_eq!(ReportView::new(&[], &state).render_table(), "(No rows loaded)");
    }
}
