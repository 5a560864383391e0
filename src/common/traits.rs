//! Traits at the seams between the batch runner and its collaborators
//!
//! The runner only talks to the remote service and to the view through these
//! interfaces, so tests can substitute in-process fakes.

use crate::batch::{LogEntry, RunState};
use crate::service::CallFailure;
use async_trait::async_trait;
use std::sync::Arc;

/// Exchanges a credential pair for a bearer token
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, login: &str, password: &str) -> Result<String, CallFailure>;
}

/// Places a child into a class/course queue using a bearer token
#[async_trait]
pub trait QueueRegistrar: Send + Sync {
    async fn register(
        &self,
        token: &str,
        child_id: &str,
        class_id: &str,
        course_id: &str,
    ) -> Result<(), CallFailure>;
}

/// Observer notified as a run advances. Receives read-only views of the run state.
pub trait ProgressReporter: Send + Sync {
    fn run_started(&self, _state: &RunState) {}

    /// Called once per row, after its entry has been appended to the log
    fn row_finished(&self, entry: &LogEntry, state: &RunState);

    fn run_finished(&self, _state: &RunState) {}
}

/// Reporter that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn row_finished(&self, _entry: &LogEntry, _state: &RunState) {}
}

#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for Arc<T> {
    async fn authenticate(&self, login: &str, password: &str) -> Result<String, CallFailure> {
        (**self).authenticate(login, password).await
    }
}

#[async_trait]
impl<T: QueueRegistrar + ?Sized> QueueRegistrar for Arc<T> {
    async fn register(
        &self,
        token: &str,
        child_id: &str,
        class_id: &str,
        course_id: &str,
    ) -> Result<(), CallFailure> {
        (**self)
            .register(token, child_id, class_id, course_id)
            .await
    }
}
