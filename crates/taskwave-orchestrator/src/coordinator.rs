//! Wave coordination: bounded fan-out and ordered fan-in.
//!
//! Every task gets its own tokio task. A task first waits on the shared
//! [`Limiter`], then runs a [`Worker`]. The coordinator joins the handles in
//! input order, so result `i` always belongs to task `i` no matter which
//! finished first. A panic inside a worker surfaces as a `JoinError` and is
//! turned into a failed result for that task only.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use taskwave_core::{CoreError, TaskDescriptor, WaveConfig, WaveId, WaveSummary, WorkerResult};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, info_span, Instrument};

use crate::config::WorkerProfile;
use crate::executor::TaskExecutor;
use crate::limiter::Limiter;
use crate::progress::ProgressSink;
use crate::worker::Worker;

/// Runs waves of tasks against one executor.
pub struct WaveCoordinator {
    worker: Arc<Worker>,
}

impl WaveCoordinator {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        profile: WorkerProfile,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            worker: Arc::new(Worker::new(executor, profile, progress)),
        }
    }

    /// Validate `config` and run its wave.
    pub async fn run(&self, config: &WaveConfig) -> Result<Vec<WorkerResult>, CoreError> {
        config.validate()?;
        self.run_wave(&config.issues, &config.main_project_dir, config.max_concurrent)
            .await
    }

    /// Run every task with at most `max_concurrent` in flight.
    ///
    /// Returns one result per task, in the order of `tasks`. Only an invalid
    /// concurrency cap fails the call; task failures are reported in the
    /// results.
    pub async fn run_wave(
        &self,
        tasks: &[TaskDescriptor],
        shared_dir: &Path,
        max_concurrent: usize,
    ) -> Result<Vec<WorkerResult>, CoreError> {
        let limiter = Limiter::new(max_concurrent)?;
        let wave_id = WaveId::generate();
        let span = info_span!("wave", wave_id = %wave_id);
        info!(
            parent: &span,
            tasks = tasks.len(),
            max_concurrent = max_concurrent,
            "Starting wave"
        );

        let shared_dir: Arc<PathBuf> = Arc::new(shared_dir.to_path_buf());
        let handles: Vec<JoinHandle<WorkerResult>> = tasks
            .iter()
            .cloned()
            .map(|task| {
                let limiter = limiter.clone();
                let worker = Arc::clone(&self.worker);
                let shared_dir = Arc::clone(&shared_dir);
                tokio::spawn(
                    async move {
                        let _permit = match limiter.acquire().await {
                            Ok(permit) => permit,
                            Err(e) => return WorkerResult::crashed(&task, e.to_string()),
                        };
                        worker.run(&task, &shared_dir).await
                    }
                    .instrument(span.clone()),
                )
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (task, handle) in tasks.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let message = join_error_message(e);
                    error!(parent: &span, task = %task.identifier, error = %message, "Worker crashed");
                    WorkerResult::crashed(task, message)
                }
            };
            results.push(result);
        }

        let summary = WaveSummary::from_results(&results);
        info!(
            parent: &span,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Wave complete"
        );
        Ok(results)
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExecutor, RecordingProgress, Script};
    use std::time::Duration;

    fn tasks(n: usize) -> Vec<TaskDescriptor> {
        (1..=n)
            .map(|i| {
                TaskDescriptor::new(format!("id-{}", i), format!("ENG-{}", i), format!("/wt/{}", i))
                    .with_title(format!("Issue {}", i))
            })
            .collect()
    }

    fn coordinator(executor: Arc<FakeExecutor>) -> WaveCoordinator {
        WaveCoordinator::new(
            executor,
            WorkerProfile::default(),
            Arc::new(RecordingProgress::default()),
        )
    }

    fn identifiers(results: &[WorkerResult]) -> Vec<&str> {
        results.iter().map(|r| r.identifier()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_input_order_not_completion_order() {
        let mut executor = FakeExecutor::new();
        for i in 1..=4u64 {
            // later tasks finish first
            executor = executor.delay(&format!("ENG-{}", i), Duration::from_secs(10 - 2 * i));
        }
        let executor = Arc::new(executor);

        let results = coordinator(executor.clone())
            .run_wave(&tasks(4), Path::new("/repo"), 4)
            .await
            .unwrap();

        assert_eq!(identifiers(&results), vec!["ENG-1", "ENG-2", "ENG-3", "ENG-4"]);
        assert_eq!(results[2].task_id().as_str(), "id-3");
        assert_eq!(executor.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_concurrency_cap() {
        let mut executor = FakeExecutor::new();
        for i in 1..=8 {
            executor = executor.delay(&format!("ENG-{}", i), Duration::from_millis(100 * i as u64));
        }
        let executor = Arc::new(executor);

        let results = coordinator(executor.clone())
            .run_wave(&tasks(8), Path::new("/repo"), 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 8);
        assert_eq!(executor.max_active(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_of_one_serializes() {
        let mut executor = FakeExecutor::new();
        for i in 1..=3 {
            executor = executor.delay(&format!("ENG-{}", i), Duration::from_millis(50));
        }
        let executor = Arc::new(executor);

        coordinator(executor.clone())
            .run_wave(&tasks(3), Path::new("/repo"), 1)
            .await
            .unwrap();

        assert_eq!(executor.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_above_task_count_admits_everyone() {
        let mut executor = FakeExecutor::new();
        for i in 1..=3 {
            executor = executor.delay(&format!("ENG-{}", i), Duration::from_secs(1));
        }
        let executor = Arc::new(executor);

        let results = coordinator(executor.clone())
            .run_wave(&tasks(3), Path::new("/repo"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success()));
        assert_eq!(executor.max_active(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_wave_outcomes() {
        let executor = Arc::new(
            FakeExecutor::new()
                .script("ENG-1", Script::succeed(1.0, 3))
                .script("ENG-2", Script::fail("build broke"))
                .script("ENG-3", Script::succeed(2.0, 5))
                .script("ENG-4", Script::fail("build broke"))
                .script("ENG-5", Script::ConnectionReset)
                .delay("ENG-1", Duration::from_millis(300))
                .delay("ENG-2", Duration::from_millis(100))
                .delay("ENG-3", Duration::from_millis(200)),
        );

        let results = coordinator(executor.clone())
            .run_wave(&tasks(5), Path::new("/repo"), 2)
            .await
            .unwrap();

        assert_eq!(
            identifiers(&results),
            vec!["ENG-1", "ENG-2", "ENG-3", "ENG-4", "ENG-5"]
        );

        assert!(results[0].success());
        assert_eq!(results[0].cost_usd(), Some(1.0));
        assert!(results[2].success());
        assert_eq!(results[2].cost_usd(), Some(2.0));

        for failed in [&results[1], &results[3]] {
            assert!(!failed.success());
            assert_eq!(failed.error(), Some("build broke"));
        }

        assert!(!results[4].success());
        assert_eq!(
            results[4].error(),
            Some(Script::connection_reset_message().as_str())
        );
        assert_eq!(results[4].session_id(), None);

        for result in &results {
            assert_eq!(result.error().is_none(), result.success());
        }
        assert!(executor.max_active() <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_worker_becomes_failed_result() {
        let executor = Arc::new(
            FakeExecutor::new()
                .script("ENG-2", Script::Panic)
                .delay("ENG-1", Duration::from_millis(50))
                .delay("ENG-3", Duration::from_millis(50)),
        );

        let results = coordinator(executor)
            .run_wave(&tasks(3), Path::new("/repo"), 1)
            .await
            .unwrap();

        assert_eq!(identifiers(&results), vec!["ENG-1", "ENG-2", "ENG-3"]);
        assert!(results[0].success());
        assert!(!results[1].success());
        assert_eq!(results[1].error(), Some("executor exploded for ENG-2"));
        assert_eq!(results[1].session_id(), None);
        // the panicked worker's slot was released, so ENG-3 still ran
        assert!(results[2].success());
    }

    #[tokio::test]
    async fn test_stream_without_result_is_reported() {
        let executor = Arc::new(FakeExecutor::new().script("ENG-1", Script::NoResult));

        let results = coordinator(executor)
            .run_wave(&tasks(2), Path::new("/repo"), 2)
            .await
            .unwrap();

        assert_eq!(results[0].error(), Some(taskwave_core::NO_RESULT_MESSAGE));
        assert!(results[1].success());
    }

    #[tokio::test]
    async fn test_empty_wave() {
        let executor = Arc::new(FakeExecutor::new());
        let results = coordinator(executor.clone())
            .run_wave(&[], Path::new("/repo"), 3)
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_any_task() {
        let executor = Arc::new(FakeExecutor::new());
        let config = WaveConfig::new(tasks(2), "/repo").with_max_concurrent(0);

        let result = coordinator(executor.clone()).run(&config).await;

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_run_uses_config_fields() {
        let executor = Arc::new(FakeExecutor::new());
        let config = WaveConfig::new(tasks(3), "/repo");

        let results = coordinator(executor.clone()).run(&config).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(executor.calls(), 3);
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "worker panicked");
    }
}
