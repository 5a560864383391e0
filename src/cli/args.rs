//! Command-line argument parsing

use crate::config::AppConfig;
use crate::error::{EnrollError, Result};
use clap::{Parser, ValueEnum};

const EXAMPLES: &str = "\
Examples:
  # Enroll every row of a spreadsheet against the default service
  queue-enroller -f children.xlsx

  # Check what would be sent without touching the network
  queue-enroller -f children.xlsx --dry-run

  # Bound each request to 30 seconds and keep a JSON report
  queue-enroller -f children.xlsx -t 30 --report-file report.json

  # Point at another deployment through the environment
  export QUEUE_ENROLLER_BASE_URL=https://staging.example.com
  queue-enroller -f children.ods --verbose";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "queue-enroller")]
#[command(about = "Enroll children into registration queues from a spreadsheet of accounts")]
#[command(version, after_help = EXAMPLES)]
pub struct Args {
    /// Spreadsheet to process
    #[arg(
        long = "file",
        short = 'f',
        help = "Spreadsheet (xlsx, xls, xlsb, ods) with login, password, childId, classId, courseId and childName columns"
    )]
    pub file: String,

    /// Configuration file path
    #[arg(long = "config", help = "Path to a JSON configuration file")]
    pub config: Option<String>,

    #[arg(long = "base-url", help = "Base URL of the queue service")]
    pub base_url: Option<String>,

    /// Timeout in seconds for each sign-in or registration request
    #[arg(
        long = "timeout",
        short = 't',
        help = "Per-request timeout in seconds (default: wait indefinitely)"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "concurrency",
        short = 'j',
        help = "Number of rows processed at once (default: 1)"
    )]
    pub concurrency: Option<usize>,

    #[arg(
        long = "skip-tls",
        short = 'k',
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Dry run mode (parse and show rows without sending requests)
    #[arg(
        long = "dry-run",
        short = 'n',
        help = "Parse the spreadsheet and show the rows without sending any request"
    )]
    pub dry_run: bool,

    #[arg(
        long = "output",
        short = 'o',
        value_enum,
        default_value = "text",
        help = "Report format printed to stdout"
    )]
    pub output: OutputFormat,

    #[arg(long = "report-file", help = "Also write the JSON report to this path")]
    pub report_file: Option<String>,

    #[arg(long = "no-color", help = "Disable coloured rows in the report table")]
    pub no_color: bool,

    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long = "quiet", short = 'q', help = "Only print errors and the final report")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<()> {
        if !std::path::Path::new(&self.file).exists() {
            return Err(EnrollError::Validation(format!(
                "File does not exist: {}",
                self.file
            )));
        }

        if self.concurrency == Some(0) {
            return Err(EnrollError::Validation(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.timeout == Some(0) {
            return Err(EnrollError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Command-line flags take precedence over every other layer
    pub fn apply_to(&self, mut config: AppConfig) -> AppConfig {
        if let Some(base_url) = &self.base_url {
            config.service.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.run.timeout_secs = Some(timeout);
        }
        if let Some(concurrency) = self.concurrency {
            config.run.concurrency = concurrency;
        }
        if self.skip_tls {
            config.service.skip_tls = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "queue-enroller",
            "-f",
            "children.xlsx",
            "--base-url",
            "http://localhost:8080",
            "-t",
            "20",
            "-j",
            "2",
        ]);

        let mut base = AppConfig::default();
        base.run.concurrency = 5;
        let config = args.apply_to(base);

        assert_eq!(config.service.base_url, "http://localhost:8080");
        assert_eq!(config.run.timeout_secs, Some(20));
        assert_eq!(config.run.concurrency, 2);
        assert!(!config.service.skip_tls);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["queue-enroller", "--file", "children.xlsx"]);
        assert_eq!(args.output, OutputFormat::Text);
        assert!(!args.dry_run);

        let config = args.apply_to(AppConfig::default());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validate_rejects_missing_file_and_zero_values() {
        let args = Args::parse_from(["queue-enroller", "-f", "/nonexistent/children.xlsx"]);
        assert!(args.validate().is_err());

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["queue-enroller", "-f", path, "-j", "0"]);
        assert!(matches!(args.validate(), Err(EnrollError::Validation(_))));

        let args = Args::parse_from(["queue-enroller", "-f", path]);
        assert!(args.validate().is_ok());
    }
}
