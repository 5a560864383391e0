//! Run state, log entries and the per-row phase machine

use crate::error::handlers::{CallStage, HttpErrorHandler};
use crate::records::RowRecord;
use crate::service::CallFailure;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Final outcome of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowStatus {
    Success,
    AuthError,
    RegistrationError,
}

impl RowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RowStatus::Success => "Success",
            RowStatus::AuthError => "Auth error",
            RowStatus::RegistrationError => "Registration error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowStatus::Success)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a row is in its authenticate-then-register sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Pending,
    Authenticating,
    AuthFailed,
    Authenticated,
    Registering,
    RegFailed,
    Registered,
}

impl RowPhase {
    pub fn is_terminal(&self) -> bool {
        self.status().is_some()
    }

    /// Status recorded for a terminal phase
    pub fn status(&self) -> Option<RowStatus> {
        match self {
            RowPhase::AuthFailed => Some(RowStatus::AuthError),
            RowPhase::RegFailed => Some(RowStatus::RegistrationError),
            RowPhase::Registered => Some(RowStatus::Success),
            _ => None,
        }
    }

    pub fn can_advance_to(&self, next: RowPhase) -> bool {
        use RowPhase::*;
        matches!(
            (self, next),
            (Pending, Authenticating)
                | (Authenticating, AuthFailed)
                | (Authenticating, Authenticated)
                | (Authenticated, Registering)
                | (Registering, RegFailed)
                | (Registering, Registered)
        )
    }

    pub(crate) fn advance(self, row: usize, next: RowPhase) -> RowPhase {
        debug_assert!(
            self.can_advance_to(next),
            "illegal row transition {:?} -> {:?}",
            self,
            next
        );
        tracing::trace!(row, from = ?self, to = ?next, "row phase");
        next
    }
}

/// Immutable outcome record for one processed row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Position of the row in the input
    pub index: usize,
    pub child_id: String,
    pub class_id: String,
    pub course_id: String,
    pub child_name: String,
    pub login: String,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<CallFailure>,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Build the entry for a finished row, stamping the current time
    pub fn new(index: usize, row: &RowRecord, status: RowStatus, cause: Option<CallFailure>) -> Self {
        Self {
            index,
            child_id: row.child_id().to_string(),
            class_id: row.class_id().to_string(),
            course_id: row.course_id().to_string(),
            child_name: row.child_name().to_string(),
            login: row.login().to_string(),
            status,
            cause,
            timestamp: Local::now(),
        }
    }

    /// Operator-facing explanation of a failure
    pub fn cause_description(&self) -> Option<String> {
        let stage = match self.status {
            RowStatus::Success => return None,
            RowStatus::AuthError => CallStage::SignIn,
            RowStatus::RegistrationError => CallStage::Registration,
        };
        self.cause
            .as_ref()
            .map(|failure| HttpErrorHandler::describe(stage, failure))
    }

    /// Child name, falling back to the login when the name column is empty
    pub fn label(&self) -> &str {
        if self.child_name.is_empty() {
            &self.login
        } else {
            &self.child_name
        }
    }
}

/// State of the current (or last) batch run
///
/// Only the batch runner mutates it; everyone else gets shared references or clones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    run_id: Option<Uuid>,
    started_at: Option<DateTime<Local>>,
    finished_at: Option<DateTime<Local>>,
    total_rows: usize,
    success_count: usize,
    log: Vec<LogEntry>,
}

impl RunState {
    /// Fresh state for a run over `total_rows` rows, started now
    pub(crate) fn begin(total_rows: usize) -> Self {
        Self {
            run_id: Some(Uuid::new_v4()),
            started_at: Some(Local::now()),
            finished_at: None,
            total_rows,
            success_count: 0,
            log: Vec::with_capacity(total_rows),
        }
    }

    pub(crate) fn record(&mut self, entry: LogEntry) {
        debug_assert!(self.log.len() < self.total_rows, "log longer than input");
        debug_assert_eq!(entry.index, self.log.len(), "log entries out of order");
        if entry.status.is_success() {
            self.success_count += 1;
        }
        self.log.push(entry);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn processed(&self) -> usize {
        self.log.len()
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.log.len() - self.success_count
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn failures(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().filter(|e| !e.status.is_success())
    }

    /// Status of the row at `index`, if it has been processed
    pub fn status_of(&self, index: usize) -> Option<RowStatus> {
        self.log.get(index).map(|e| e.status)
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.finished_at.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Percentage of rows processed
    pub fn progress(&self) -> f64 {
        if self.total_rows == 0 {
            if self.is_finished() { 100.0 } else { 0.0 }
        } else {
            (self.log.len() as f64 / self.total_rows as f64) * 100.0
        }
    }
}
