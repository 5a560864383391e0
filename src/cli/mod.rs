//! Command line interface module
//!
//! Argument parsing, validation, and the runner that drives a batch from a
//! spreadsheet path to a printed report.

pub mod args;
pub mod runner;

pub use args::{Args, OutputFormat};
pub use runner::Runner;
