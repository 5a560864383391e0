//! Runner wiring arguments, configuration, records, clients and the report together

use crate::batch::{BatchRunner, ProgressTracker, RunState};
use crate::cli::args::{Args, OutputFormat};
use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::Logger;
use crate::records::{
    FIELD_CHILD_ID, FIELD_CLASS_ID, FIELD_COURSE_ID, FIELD_LOGIN, FIELD_PASSWORD, RecordSource,
    RowRecord,
};
use crate::report::ReportView;
use crate::service::ServiceClient;
use std::path::Path;
use std::sync::Arc;

const REQUIRED_COLUMNS: &[&str] = &[
    FIELD_LOGIN,
    FIELD_PASSWORD,
    FIELD_CHILD_ID,
    FIELD_CLASS_ID,
    FIELD_COURSE_ID,
];

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        // JSON goes to stdout on its own
        let output = if args.quiet || args.output == OutputFormat::Json {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Self { args, output }
    }

    pub async fn run(&self) -> Result<()> {
        self.output.section("Queue Enroller");

        self.args.validate()?;
        let config = self.load_config()?;
        let rows = self.load_records()?;

        if self.args.dry_run {
            self.output.subsection("Loaded rows");
            self.output.block(
                &ReportView::new(&rows, &RunState::default())
                    .with_color(!self.args.no_color)
                    .render_table(),
            );
            self.output.info("Dry run mode - no requests sent");
            return Ok(());
        }

        let state = self.enroll(&config, &rows).await?;
        self.report(&rows, &state)?;

        self.output.success(&format!(
            "Finished in {}",
            self.output.format_duration(self.output.elapsed())
        ));
        Ok(())
    }

    fn load_config(&self) -> Result<AppConfig> {
        self.output.subsection("Loading configuration");

        let mut config = AppConfig::default();
        if let Some(path) = &self.args.config {
            self.output.step(&format!("Reading {}", path));
            config = config.merge(&AppConfig::from_file(Path::new(path))?);
        }
        let config = self.args.apply_to(config.apply_env());
        config.validate()?;

        self.output.info(&format!("Service: {}", config.service.base_url));
        self.output.info(&format!(
            "Request timeout: {}",
            config
                .run
                .timeout_secs
                .map(|t| format!("{}s", t))
                .unwrap_or_else(|| "disabled".to_string())
        ));
        self.output
            .info(&format!("Concurrency: {}", config.run.concurrency));
        if config.run.timeout().is_none() {
            self.output
                .detail("No request timeout: an unresponsive endpoint stalls the remaining rows");
        }

        Ok(config)
    }

    fn load_records(&self) -> Result<Vec<RowRecord>> {
        self.output.subsection("Reading spreadsheet");

        let rows = RecordSource::read_file(Path::new(&self.args.file))?;
        self.output
            .info(&format!("{}: {} rows", self.args.file, rows.len()));

        if let Some(first) = rows.first() {
            self.output.verbose(&format!(
                "Columns: {}",
                first.headers().collect::<Vec<_>>().join(", ")
            ));

            let missing: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|column| first.get(column).is_none())
                .collect();
            if !missing.is_empty() {
                self.output.warning(&format!(
                    "First row has no value for: {} (sent as empty)",
                    missing.join(", ")
                ));
            }
        }

        Ok(rows)
    }

    async fn enroll(&self, config: &AppConfig, rows: &[RowRecord]) -> Result<RunState> {
        self.output.subsection("Enrolling");

        let (auth, queue) = ServiceClient::builder(config.service.clone())
            .with_timeout(config.run.timeout())
            .build()?
            .into_parts();

        let tracker = ProgressTracker::new(self.output.clone(), "Enrolling");
        let runner = BatchRunner::new(auth, queue)
            .with_concurrency(config.run.concurrency)
            .with_reporter(Arc::new(tracker));

        runner.run(rows).await
    }

    fn report(&self, rows: &[RowRecord], state: &RunState) -> Result<()> {
        let view = ReportView::new(rows, state).with_color(!self.args.no_color);

        match self.args.output {
            OutputFormat::Text => {
                self.output.section("Report");
                self.output.block(&view.render_table());
                self.output.summary_kv("Summary", &view.summary_items());
                let failures = view.failure_lines();
                if !failures.is_empty() {
                    self.output.list("Failed rows", &failures);
                }
            }
            OutputFormat::Json => println!("{}", view.to_json()?),
        }

        if let Some(path) = &self.args.report_file {
            view.write_json(Path::new(path))?;
            self.output.success(&format!("Report written to {}", path));
        }

        Ok(())
    }
}
