//! Task execution via the Claude Code SDK.
//!
//! Translates the SDK's `ClaudeMessage` stream into the orchestrator's
//! [`AgentEvent`]s.

use async_trait::async_trait;
use serde_json::Value;
use taskwave_claude_sdk::{ClaudeExecutor, ClaudeMessage, ContentItem, ToolData};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::executor::{AgentEvent, EventStream, ExecutionRequest, ExecutorError, TaskExecutor};

const EVENT_BUFFER: usize = 64;

/// Executes tasks by spawning the Claude Code CLI.
#[derive(Debug, Clone)]
pub struct ClaudeTaskExecutor {
    /// Path to the claude CLI binary.
    claude_path: String,
}

impl ClaudeTaskExecutor {
    /// Create a new executor with the given claude CLI path.
    pub fn new(claude_path: impl Into<String>) -> Self {
        Self {
            claude_path: claude_path.into(),
        }
    }

    fn sdk_executor(&self, request: &ExecutionRequest) -> ClaudeExecutor {
        let mut executor = ClaudeExecutor::new(&self.claude_path)
            .with_permission_mode(request.permission_mode)
            .with_allowed_tools(request.allowed_tools.iter().cloned());

        if let Some(turns) = request.max_turns {
            executor = executor.with_max_turns(turns);
        }
        if let Some(model) = &request.model {
            executor = executor.with_model(model);
        }
        for dir in &request.add_dirs {
            executor = executor.with_add_dir(dir);
        }
        for source in &request.setting_sources {
            executor = executor.with_setting_source(source);
        }
        for dir in &request.plugin_dirs {
            executor = executor.with_plugin_dir(dir);
        }
        for (key, value) in &request.env {
            executor = executor.with_env(key, value);
        }
        executor
    }
}

#[async_trait]
impl TaskExecutor for ClaudeTaskExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<EventStream, ExecutorError> {
        info!(
            task = %request.task_identifier,
            working_dir = %request.working_dir.display(),
            "Starting Claude execution"
        );

        let mut messages = self
            .sdk_executor(&request)
            .stream(&request.working_dir, &request.prompt)?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task = request.task_identifier;
        tokio::spawn(async move {
            while let Some(item) = messages.next().await {
                match item {
                    Ok(message) => {
                        debug!(task = %task, kind = message.kind(), "Claude message");
                        for event in translate(message) {
                            if tx.send(Ok(event)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ExecutorError::from(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Map one Claude message to zero or more agent events.
pub(crate) fn translate(message: ClaudeMessage) -> Vec<AgentEvent> {
    match message {
        ClaudeMessage::System { session_id, .. } => session_id
            .map(|session_id| AgentEvent::Session { session_id })
            .into_iter()
            .collect(),
        ClaudeMessage::Assistant { message, .. } => message
            .content
            .into_iter()
            .filter_map(|item| match item {
                ContentItem::ToolUse { tool_data, .. } => Some(action_event(&tool_data)),
                _ => None,
            })
            .collect(),
        ClaudeMessage::User { .. } => Vec::new(),
        ClaudeMessage::Result {
            subtype,
            is_error,
            total_cost_usd,
            num_turns,
            result,
            error,
            session_id,
            ..
        } => {
            let failed = is_error.unwrap_or(false)
                || subtype.as_deref().is_some_and(|s| s.starts_with("error"));
            if failed {
                let error = result
                    .as_ref()
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .or(error)
                    .or(subtype)
                    .unwrap_or_else(|| "Unknown error".to_string());
                vec![AgentEvent::Failure {
                    session_id,
                    error,
                    cost_usd: total_cost_usd,
                    num_turns,
                }]
            } else {
                vec![AgentEvent::Success {
                    session_id,
                    cost_usd: total_cost_usd,
                    num_turns,
                }]
            }
        }
        ClaudeMessage::Unknown(value) => {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            vec![AgentEvent::Unknown { kind }]
        }
    }
}

fn action_event(tool: &ToolData) -> AgentEvent {
    let detail = match tool {
        ToolData::Skill { skill, .. } => Some(skill.clone().unwrap_or_default()),
        ToolData::Task { subagent_type, .. } => Some(format!(
            "type={}",
            subagent_type.as_deref().unwrap_or_default()
        )),
        _ => None,
    };
    AgentEvent::Action {
        name: tool.name().to_string(),
        detail,
    }
}
