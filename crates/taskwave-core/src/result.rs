//! Per-task results and the wave summary built from them.

use serde::Serialize;

use crate::{TaskDescriptor, TaskId};

/// Error recorded when the executor's stream ends without a terminal event.
pub const NO_RESULT_MESSAGE: &str = "No result message received";

/// Terminal record of one task.
///
/// Fields are private so the only way to build a result is through the
/// constructors below, which keep `error` present exactly when `success`
/// is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerResult {
    #[serde(rename = "issue_id")]
    task_id: TaskId,
    identifier: String,
    session_id: Option<String>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    cost_usd: Option<f64>,
    num_turns: Option<u32>,
}

impl WorkerResult {
    /// The executor reported success.
    pub fn succeeded(
        task: &TaskDescriptor,
        session_id: Option<String>,
        cost_usd: Option<f64>,
        num_turns: Option<u32>,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            identifier: task.identifier.clone(),
            session_id,
            success: true,
            error: None,
            cost_usd,
            num_turns,
        }
    }

    /// The executor finished but reported failure.
    pub fn failed(
        task: &TaskDescriptor,
        session_id: Option<String>,
        error: impl Into<String>,
        cost_usd: Option<f64>,
        num_turns: Option<u32>,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            identifier: task.identifier.clone(),
            session_id,
            success: false,
            error: Some(error.into()),
            cost_usd,
            num_turns,
        }
    }

    /// Execution was cut short by a fault; no metrics are available.
    pub fn aborted(
        task: &TaskDescriptor,
        session_id: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::failed(task, session_id, error, None, None)
    }

    /// The stream ended without a terminal event.
    pub fn no_result(task: &TaskDescriptor, session_id: Option<String>) -> Self {
        Self::aborted(task, session_id, NO_RESULT_MESSAGE)
    }

    /// The worker itself crashed; nothing it captured survives.
    pub fn crashed(task: &TaskDescriptor, error: impl Into<String>) -> Self {
        Self::aborted(task, None, error)
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cost_usd(&self) -> Option<f64> {
        self.cost_usd
    }

    pub fn num_turns(&self) -> Option<u32> {
        self.num_turns
    }
}

/// Success/failure counts for a finished wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl WaveSummary {
    /// Tally a result list.
    pub fn from_results(results: &[WorkerResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success()).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    /// Total number of results counted.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Returns true if no task failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
