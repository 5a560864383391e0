//! Live progress output for batch runs

use crate::batch::state::{LogEntry, RunState};
use crate::common::traits::ProgressReporter;
use crate::logging::Logger;

const BAR_WIDTH: usize = 20;

/// Prints one progress line per finished row through the [`Logger`]
#[derive(Clone)]
pub struct ProgressTracker {
    output: Logger,
    operation_name: String,
}

impl ProgressTracker {
    pub fn new(output: Logger, operation_name: impl Into<String>) -> Self {
        Self {
            output,
            operation_name: operation_name.into(),
        }
    }

    /// Progress line shown after a row finishes
    pub fn format_row_line(&self, entry: &LogEntry, state: &RunState) -> String {
        let percent = state.progress();
        format!(
            "{}: {} {:.1}% | {}/{} rows | {} registered | #{} {} - {}",
            self.operation_name,
            render_bar(percent, BAR_WIDTH),
            percent,
            state.processed(),
            state.total_rows(),
            state.success_count(),
            entry.index + 1,
            entry.label(),
            entry.status
        )
    }
}

impl ProgressReporter for ProgressTracker {
    fn run_started(&self, state: &RunState) {
        self.output.step(&format!(
            "{}: {} rows queued",
            self.operation_name,
            state.total_rows()
        ));
    }

    fn row_finished(&self, entry: &LogEntry, state: &RunState) {
        self.output.progress(&self.format_row_line(entry, state));
        if let Some(cause) = entry.cause_description() {
            self.output.detail(&cause);
        }
    }

    fn run_finished(&self, state: &RunState) {
        let elapsed = match (state.started_at(), state.finished_at()) {
            (Some(start), Some(end)) => (end - start).to_std().unwrap_or_default(),
            _ => Default::default(),
        };

        self.output.success(&format!(
            "{} completed in {} ({} registered, {} failed)",
            self.operation_name,
            self.output.format_duration(elapsed),
            state.success_count(),
            state.failure_count()
        ));
    }
}

/// Fixed-width text progress bar for a percentage
pub fn render_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::state::RowStatus;
    use crate::records::RowRecord;

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0.0, 4), "[░░░░]");
        assert_eq!(render_bar(50.0, 4), "[██░░]");
        assert_eq!(render_bar(100.0, 4), "[████]");
        assert_eq!(render_bar(250.0, 4), "[████]");
    }

    #[test]
    fn test_row_line() {
        let tracker = ProgressTracker::new(Logger::new_quiet(), "Enrolling");
        let mut state = RunState::begin(2);
        let row = RowRecord::new()
            .with_field("login", "u1")
            .with_field("childName", "Aruzhan");
        state.record(LogEntry::new(0, &row, RowStatus::Success, None));

        let line = tracker.format_row_line(&state.log()[0], &state);
        assert!(line.starts_with("Enrolling: [██████████░░░░░░░░░░] 50.0%"));
        assert!(line.contains("1/2 rows"));
        assert!(line.ends_with("#1 Aruzhan - Success"));
    }
}
