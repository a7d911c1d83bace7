//! Runs one task end to end.
//!
//! A worker never fails: every outcome, including executor faults, is
//! folded into the [`WorkerResult`] it returns.

use std::path::Path;
use std::sync::Arc;

use taskwave_core::{TaskDescriptor, WorkerResult};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::config::WorkerProfile;
use crate::executor::{AgentEvent, ExecutorError, TaskExecutor};
use crate::progress::ProgressSink;

/// Drives the executor for a single task and reports its progress.
pub struct Worker {
    executor: Arc<dyn TaskExecutor>,
    profile: WorkerProfile,
    progress: Arc<dyn ProgressSink>,
}

impl Worker {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        profile: WorkerProfile,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            executor,
            profile,
            progress,
        }
    }

    /// Run `task` to a terminal result.
    pub async fn run(&self, task: &TaskDescriptor, shared_dir: &Path) -> WorkerResult {
        let mut session_id = None;
        self.progress.emit(&task.identifier, "Starting resolution");
        info!(task = %task.identifier, "Worker started");

        match self.drive(task, shared_dir, &mut session_id).await {
            Ok(result) => result,
            Err(e) => {
                let message = e.to_string();
                warn!(task = %task.identifier, error = %message, "Worker fault");
                self.progress
                    .emit(&task.identifier, &format!("ERROR: {}", message));
                WorkerResult::aborted(task, session_id, message)
            }
        }
    }

    async fn drive(
        &self,
        task: &TaskDescriptor,
        shared_dir: &Path,
        session_id: &mut Option<String>,
    ) -> Result<WorkerResult, ExecutorError> {
        let request = self.profile.request_for(task, shared_dir);
        let mut events = self.executor.execute(request).await?;

        while let Some(event) = events.next().await {
            match event? {
                AgentEvent::Session { session_id: sid } => {
                    debug!(task = %task.identifier, session_id = %sid, "Captured session ID");
                    *session_id = Some(sid);
                }
                AgentEvent::Action { name, detail } => {
                    let line = match detail {
                        Some(detail) => format!("-> {} {}", name, detail),
                        None => format!("-> {}", name),
                    };
                    self.progress.emit(&task.identifier, &line);
                }
                AgentEvent::Failure {
                    session_id: sid,
                    error,
                    cost_usd,
                    num_turns,
                } => {
                    self.progress.emit(
                        &task.identifier,
                        &format!("FAILED{}", metrics_suffix(cost_usd, None)),
                    );
                    info!(task = %task.identifier, error = %error, "Task failed");
                    let sid = sid.or_else(|| session_id.take());
                    return Ok(WorkerResult::failed(task, sid, error, cost_usd, num_turns));
                }
                AgentEvent::Success {
                    session_id: sid,
                    cost_usd,
                    num_turns,
                } => {
                    self.progress.emit(
                        &task.identifier,
                        &format!("Complete{}", metrics_suffix(cost_usd, num_turns)),
                    );
                    info!(task = %task.identifier, "Task completed");
                    let sid = sid.or_else(|| session_id.take());
                    return Ok(WorkerResult::succeeded(task, sid, cost_usd, num_turns));
                }
                AgentEvent::Unknown { kind } => {
                    debug!(task = %task.identifier, kind = %kind, "Ignoring unknown event");
                }
            }
        }

        warn!(task = %task.identifier, "Event stream ended without a result");
        let result = WorkerResult::no_result(task, session_id.take());
        if let Some(error) = result.error() {
            self.progress
                .emit(&task.identifier, &format!("FAILED: {}", error));
        }
        Ok(result)
    }
}

/// ` (cost: $1.23, turns: 4)`, or empty when no metric is known.
fn metrics_suffix(cost_usd: Option<f64>, num_turns: Option<u32>) -> String {
    let mut parts = Vec::new();
    if let Some(cost) = cost_usd {
        parts.push(format!("cost: ${:.2}", cost));
    }
    if let Some(turns) = num_turns {
        parts.push(format!("turns: {}", turns));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExecutor, RecordingProgress, Script};
    use taskwave_core::NO_RESULT_MESSAGE;

    fn task(identifier: &str) -> TaskDescriptor {
        TaskDescriptor::new(format!("id-{}", identifier), identifier, format!("/wt/{}", identifier))
    }

    fn worker(executor: FakeExecutor) -> (Worker, Arc<RecordingProgress>) {
        let progress = Arc::new(RecordingProgress::default());
        let worker = Worker::new(Arc::new(executor), WorkerProfile::default(), progress.clone());
        (worker, progress)
    }

    #[test]
    fn test_metrics_suffix() {
        assert_eq!(metrics_suffix(Some(1.0), Some(3)), " (cost: $1.00, turns: 3)");
        assert_eq!(metrics_suffix(Some(0.456), None), " (cost: $0.46)");
        assert_eq!(metrics_suffix(None, None), "");
    }

    #[tokio::test]
    async fn test_success_result_and_progress() {
        let executor = FakeExecutor::new().script("ENG-1", Script::succeed(1.0, 4));
        let (worker, progress) = worker(executor);

        let result = worker.run(&task("ENG-1"), Path::new("/repo")).await;

        assert!(result.success());
        assert_eq!(result.error(), None);
        assert_eq!(result.session_id(), Some("session-ENG-1"));
        assert_eq!(result.cost_usd(), Some(1.0));
        assert_eq!(result.num_turns(), Some(4));
        assert_eq!(
            progress.messages_for("ENG-1"),
            vec![
                "Starting resolution".to_string(),
                "-> Skill resolve-linear-issue".to_string(),
                "-> Task type=pr-reviewer".to_string(),
                "Complete (cost: $1.00, turns: 4)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_reported_failure_keeps_metrics() {
        let executor = FakeExecutor::new().script("ENG-2", Script::fail("build broke"));
        let (worker, progress) = worker(executor);

        let result = worker.run(&task("ENG-2"), Path::new("/repo")).await;

        assert!(!result.success());
        assert_eq!(result.error(), Some("build broke"));
        assert_eq!(result.cost_usd(), Some(0.5));
        assert_eq!(result.session_id(), Some("session-ENG-2"));
        assert!(progress
            .messages_for("ENG-2")
            .contains(&"FAILED (cost: $0.50)".to_string()));
    }

    #[tokio::test]
    async fn test_stream_without_terminal_event() {
        let executor = FakeExecutor::new().script("ENG-3", Script::NoResult);
        let (worker, _progress) = worker(executor);

        let result = worker.run(&task("ENG-3"), Path::new("/repo")).await;

        assert!(!result.success());
        assert_eq!(result.error(), Some(NO_RESULT_MESSAGE));
        assert_eq!(result.session_id(), Some("session-ENG-3"));
    }

    #[tokio::test]
    async fn test_executor_fault_is_contained() {
        let executor = FakeExecutor::new().script("ENG-4", Script::ConnectionReset);
        let (worker, progress) = worker(executor);

        let result = worker.run(&task("ENG-4"), Path::new("/repo")).await;

        assert!(!result.success());
        assert_eq!(result.error(), Some(Script::connection_reset_message().as_str()));
        assert_eq!(result.session_id(), None);
        assert!(result.cost_usd().is_none());
        let lines = progress.messages_for("ENG-4");
        assert_eq!(
            lines.last().unwrap(),
            &format!("ERROR: {}", Script::connection_reset_message())
        );
    }

    #[tokio::test]
    async fn test_mid_stream_fault_keeps_captured_session() {
        let executor = FakeExecutor::new().script("ENG-5", Script::MidStreamFault);
        let (worker, _progress) = worker(executor);

        let result = worker.run(&task("ENG-5"), Path::new("/repo")).await;

        assert!(!result.success());
        assert_eq!(result.session_id(), Some("session-ENG-5"));
        assert_eq!(
            result.error(),
            Some("Malformed executor event: truncated line")
        );
    }

    #[tokio::test]
    async fn test_unknown_events_are_ignored() {
        let executor = FakeExecutor::new().script("ENG-6", Script::UnknownThenSucceed);
        let (worker, progress) = worker(executor);

        let result = worker.run(&task("ENG-6"), Path::new("/repo")).await;

        assert!(result.success());
        assert_eq!(progress.messages_for("ENG-6").len(), 2);
    }
}
