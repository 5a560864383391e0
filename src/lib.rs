//! Queue Enroller Library
//!
//! Reads a spreadsheet of accounts, signs each one in against the queue service,
//! registers the child into the requested class/course queue, and reports the
//! outcome of every row.

pub mod batch;
pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;
pub mod report;
pub mod service;

pub use batch::{BatchRunner, LogEntry, RowStatus, RunState};
pub use config::AppConfig;
pub use error::{EnrollError, Result};
pub use records::{RecordSource, RowRecord};
pub use service::{CallFailure, ServiceClient};
