//! Scripted executor and progress recorder shared by the unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::{AgentEvent, EventStream, ExecutionRequest, ExecutorError, TaskExecutor};
use crate::progress::ProgressSink;

/// What the fake executor does for one task.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Succeed { cost_usd: f64, num_turns: u32 },
    Fail { error: String },
    NoResult,
    ConnectionReset,
    MidStreamFault,
    UnknownThenSucceed,
    Panic,
}

impl Script {
    pub(crate) fn succeed(cost_usd: f64, num_turns: u32) -> Self {
        Self::Succeed { cost_usd, num_turns }
    }

    pub(crate) fn fail(error: &str) -> Self {
        Self::Fail {
            error: error.to_string(),
        }
    }

    pub(crate) fn connection_reset_message() -> String {
        ExecutorError::from(io::Error::from(io::ErrorKind::ConnectionReset)).to_string()
    }
}

/// Executor keyed by task identifier. Tasks without a script succeed.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(mut self, identifier: &str, script: Script) -> Self {
        self.scripts.insert(identifier.to_string(), script);
        self
    }

    /// Hold the admission slot for `delay` before returning the stream.
    pub(crate) fn delay(mut self, identifier: &str, delay: Duration) -> Self {
        self.delays.insert(identifier.to_string(), delay);
        self
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for FakeExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<EventStream, ExecutorError> {
        let identifier = request.task_identifier;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&identifier) {
            tokio::time::sleep(*delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&identifier)
            .cloned()
            .unwrap_or(Script::succeed(1.0, 1));
        let session_id = format!("session-{}", identifier);
        let session = || -> Result<AgentEvent, ExecutorError> {
            Ok(AgentEvent::Session {
                session_id: session_id.clone(),
            })
        };

        let events: Vec<Result<AgentEvent, ExecutorError>> = match script {
            Script::Succeed { cost_usd, num_turns } => vec![
                session(),
                Ok(AgentEvent::Action {
                    name: "Skill".to_string(),
                    detail: Some("resolve-linear-issue".to_string()),
                }),
                Ok(AgentEvent::Action {
                    name: "Task".to_string(),
                    detail: Some("type=pr-reviewer".to_string()),
                }),
                Ok(AgentEvent::Success {
                    session_id: Some(session_id.clone()),
                    cost_usd: Some(cost_usd),
                    num_turns: Some(num_turns),
                }),
            ],
            Script::Fail { error } => vec![
                session(),
                Ok(AgentEvent::Failure {
                    session_id: Some(session_id.clone()),
                    error,
                    cost_usd: Some(0.5),
                    num_turns: Some(2),
                }),
            ],
            Script::NoResult => vec![
                session(),
                Ok(AgentEvent::Action {
                    name: "Bash".to_string(),
                    detail: None,
                }),
            ],
            Script::ConnectionReset => {
                return Err(io::Error::from(io::ErrorKind::ConnectionReset).into());
            }
            Script::MidStreamFault => vec![
                session(),
                Err(ExecutorError::Malformed("truncated line".to_string())),
            ],
            Script::UnknownThenSucceed => vec![
                Ok(AgentEvent::Unknown {
                    kind: "rate_limit_event".to_string(),
                }),
                Ok(AgentEvent::Success {
                    session_id: None,
                    cost_usd: None,
                    num_turns: None,
                }),
            ],
            Script::Panic => panic!("executor exploded for {}", identifier),
        };

        Ok(Box::pin(tokio_stream::iter(events)))
    }
}

/// Progress sink that keeps every line in memory.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    lines: Mutex<Vec<(String, String)>>,
}

impl RecordingProgress {
    pub(crate) fn messages_for(&self, identifier: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(ident, _)| ident == identifier)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, identifier: &str, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((identifier.to_string(), message.to_string()));
    }
}
