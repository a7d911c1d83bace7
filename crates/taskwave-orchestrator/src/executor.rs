//! The seam between the orchestrator and whatever performs a task.
//!
//! A [`TaskExecutor`] turns an [`ExecutionRequest`] into a stream of
//! [`AgentEvent`]s. The worker only ever sees this trait, so tests drive
//! it with fakes and production drives it with Claude Code.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use taskwave_claude_sdk::{PermissionMode, SdkError};
use thiserror::Error;
use tokio_stream::Stream;

/// Faults raised while driving an executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Malformed executor event: {0}")]
    Malformed(String),
}

/// Progress and outcome events emitted by an executor.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The executor opened a session; its handle is known from here on.
    Session { session_id: String },

    /// A sub-action (tool call, sub-agent) was invoked.
    Action {
        name: String,
        detail: Option<String>,
    },

    /// Terminal: the work finished successfully.
    Success {
        session_id: Option<String>,
        cost_usd: Option<f64>,
        num_turns: Option<u32>,
    },

    /// Terminal: the work finished and reported failure.
    Failure {
        session_id: Option<String>,
        error: String,
        cost_usd: Option<f64>,
        num_turns: Option<u32>,
    },

    /// Anything else the executor produced.
    Unknown { kind: String },
}

/// Asynchronous sequence of events for one task.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, ExecutorError>> + Send>>;

/// Everything an executor needs to run one task.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Identifier of the task, for log correlation.
    pub task_identifier: String,
    /// Directory the work runs in.
    pub working_dir: PathBuf,
    /// Additional directories the work may touch.
    pub add_dirs: Vec<PathBuf>,
    /// Instructions for the agent.
    pub prompt: String,
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub max_turns: Option<u32>,
    pub env: Vec<(String, String)>,
    pub setting_sources: Vec<String>,
    pub plugin_dirs: Vec<PathBuf>,
    pub model: Option<String>,
}

/// Performs the unit of work behind a task.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Start the work and return its event stream.
    async fn execute(&self, request: ExecutionRequest) -> Result<EventStream, ExecutorError>;
}
