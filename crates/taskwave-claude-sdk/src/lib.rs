//! Claude Code SDK for taskwave
//!
//! This crate drives the Claude Code CLI in one-shot `--print` mode and
//! exposes its `stream-json` output as an async stream of typed messages.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use taskwave_claude_sdk::{ClaudeExecutor, ClaudeMessage, PermissionMode};
//! use tokio_stream::StreamExt;
//!
//! async fn run_agent() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = ClaudeExecutor::new("claude")
//!         .with_permission_mode(PermissionMode::BypassPermissions)
//!         .with_max_turns(10);
//!
//!     let mut messages = executor.stream(Path::new("."), "What is 2 + 2?")?;
//!     while let Some(message) = messages.next().await {
//!         if let ClaudeMessage::Result { session_id, .. } = message? {
//!             println!("Session ID: {:?}", session_id);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod executor;
mod types;

// Re-export main types
pub use error::SdkError;
pub use executor::{ClaudeExecutor, MessageStream};
pub use types::{AssistantMessage, ClaudeMessage, ContentItem, PermissionMode, ToolData, UserMessage};
