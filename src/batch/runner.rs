//! Batch runner: authenticate then register, row by row

use crate::batch::state::{LogEntry, RowPhase, RowStatus, RunState};
use crate::common::traits::{Authenticator, NoopReporter, ProgressReporter, QueueRegistrar};
use crate::error::{EnrollError, Result};
use crate::records::RowRecord;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// Drives one run at a time over a set of rows.
///
/// Rows are processed in input order. With the default concurrency of 1 the next
/// row's sign-in starts only after the previous row's registration resolved; a
/// higher limit lets rows overlap but entries are still logged in input order.
/// A failing row never stops the run.
pub struct BatchRunner<A, Q> {
    auth: A,
    queue: Q,
    concurrency: usize,
    reporter: Arc<dyn ProgressReporter>,
    state: RwLock<RunState>,
    active: AtomicBool,
}

impl<A, Q> BatchRunner<A, Q>
where
    A: Authenticator,
    Q: QueueRegistrar,
{
    pub fn new(auth: A, queue: Q) -> Self {
        Self {
            auth,
            queue,
            concurrency: 1,
            reporter: Arc::new(NoopReporter),
            state: RwLock::new(RunState::default()),
            active: AtomicBool::new(false),
        }
    }

    /// Maximum rows in flight; values below 1 are treated as 1
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Snapshot of the current or last run
    pub fn state(&self) -> RunState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Process every row and return the final run state.
    ///
    /// Fails only with [`EnrollError::RunInProgress`] when another run is active.
    pub async fn run(&self, rows: &[RowRecord]) -> Result<RunState> {
        let _active = ActiveRun::acquire(&self.active)?;
        let total = rows.len();

        {
            let mut state = self.write_state();
            *state = RunState::begin(total);
            self.reporter.run_started(&state);
        }
        tracing::info!(rows = total, concurrency = self.concurrency, "batch run started");

        let mut entries = stream::iter(rows.iter().enumerate())
            .map(|(index, row)| self.process_row(index, row))
            .buffered(self.concurrency);

        while let Some(entry) = entries.next().await {
            let mut state = self.write_state();
            state.record(entry);
            if let Some(entry) = state.log().last() {
                self.reporter.row_finished(entry, &state);
            }
        }

        let finished = {
            let mut state = self.write_state();
            state.finish();
            self.reporter.run_finished(&state);
            state.clone()
        };
        tracing::info!(
            rows = total,
            succeeded = finished.success_count(),
            failed = finished.failure_count(),
            "batch run finished"
        );

        Ok(finished)
    }

    async fn process_row(&self, index: usize, row: &RowRecord) -> LogEntry {
        let phase = RowPhase::Pending.advance(index, RowPhase::Authenticating);

        let (phase, status, cause) = match self.auth.authenticate(row.login(), row.password()).await {
            Err(failure) => (
                phase.advance(index, RowPhase::AuthFailed),
                RowStatus::AuthError,
                Some(failure),
            ),
            Ok(token) => {
                let phase = phase
                    .advance(index, RowPhase::Authenticated)
                    .advance(index, RowPhase::Registering);
                match self
                    .queue
                    .register(&token, row.child_id(), row.class_id(), row.course_id())
                    .await
                {
                    Ok(()) => (
                        phase.advance(index, RowPhase::Registered),
                        RowStatus::Success,
                        None,
                    ),
                    Err(failure) => (
                        phase.advance(index, RowPhase::RegFailed),
                        RowStatus::RegistrationError,
                        Some(failure),
                    ),
                }
            }
        };
        debug_assert_eq!(phase.status(), Some(status));

        if let Some(failure) = &cause {
            tracing::debug!(row = index, login = row.login(), %status, %failure, "row failed");
        }

        LogEntry::new(index, row, status, cause)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RunState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the runner busy for the lifetime of one run
struct ActiveRun<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ActiveRun<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EnrollError::RunInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
