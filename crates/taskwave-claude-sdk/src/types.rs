//! Type definitions for Claude Code `stream-json` messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of `stream-json` output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeMessage {
    /// Session start; carries the session handle.
    System {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        cwd: Option<String>,
    },

    /// A model turn, possibly containing tool calls.
    Assistant {
        message: AssistantMessage,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// User message (tool results echoed back).
    User {
        message: UserMessage,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Terminal execution result.
    Result {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default, alias = "isError")]
        is_error: Option<bool>,
        #[serde(default, alias = "durationMs")]
        duration_ms: Option<u64>,
        #[serde(default, alias = "numTurns")]
        num_turns: Option<u32>,
        #[serde(default, alias = "totalCostUsd", alias = "cost_usd")]
        total_cost_usd: Option<f64>,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default, alias = "sessionId")]
        session_id: Option<String>,
    },

    /// Any message type this crate does not model.
    #[serde(untagged)]
    Unknown(Value),
}

impl ClaudeMessage {
    /// Session handle carried by the message, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::System { session_id, .. } => session_id.as_deref(),
            Self::Assistant { session_id, .. } => session_id.as_deref(),
            Self::User { session_id, .. } => session_id.as_deref(),
            Self::Result { session_id, .. } => session_id.as_deref(),
            Self::Unknown(_) => None,
        }
    }

    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "System",
            Self::Assistant { .. } => "Assistant",
            Self::User { .. } => "User",
            Self::Result { .. } => "Result",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// Body of an assistant turn.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Body of a user turn.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

/// A block inside a message body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text { text: String },

    /// Extended thinking.
    Thinking { thinking: String },

    /// A tool call.
    ToolUse {
        id: String,
        #[serde(flatten)]
        tool_data: ToolData,
    },

    /// Output of an earlier tool call.
    ToolResult {
        tool_use_id: String,
        content: Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
}

/// Structured tool data for the Claude tools a wave cares about.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "name", content = "input")]
pub enum ToolData {
    /// Shell command.
    Bash {
        #[serde(alias = "cmd")]
        command: String,
        #[serde(default)]
        description: Option<String>,
    },

    /// Sub-agent launch.
    Task {
        #[serde(default)]
        subagent_type: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        prompt: Option<String>,
    },

    /// Invoke a named skill.
    Skill {
        #[serde(default)]
        skill: Option<String>,
        #[serde(default)]
        args: Option<String>,
    },

    /// Any other tool (fallback).
    #[serde(untagged)]
    Unknown(HashMap<String, Value>),
}

impl ToolData {
    /// Tool name as Claude reports it.
    pub fn name(&self) -> &str {
        match self {
            Self::Bash { .. } => "Bash",
            Self::Task { .. } => "Task",
            Self::Skill { .. } => "Skill",
            Self::Unknown(data) => data
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
        }
    }
}

/// Value of `--permission-mode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Prompt for every permission. Not passed on the command line.
    #[default]
    Default,
    AcceptEdits,
    Plan,
    /// Never prompt; used for unattended waves.
    BypassPermissions,
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::AcceptEdits => write!(f, "acceptEdits"),
            Self::Plan => write!(f, "plan"),
            Self::BypassPermissions => write!(f, "bypassPermissions"),
        }
    }
}
