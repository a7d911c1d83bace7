//! One-shot Claude Code runs.
//!
//! [`ClaudeExecutor`] spawns `claude --print` with `stream-json` output and
//! turns stdout into a [`MessageStream`].

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use crate::error::SdkError;
use crate::types::{ClaudeMessage, PermissionMode};

/// Messages parsed from one Claude process, in the order they were printed.
///
/// A process that exits non-zero without printing a result message ends the
/// stream with an `Err`.
pub type MessageStream = ReceiverStream<Result<ClaudeMessage, SdkError>>;

const MESSAGE_BUFFER: usize = 64;

/// Builder for a Claude CLI invocation.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use taskwave_claude_sdk::{ClaudeExecutor, PermissionMode};
///
/// fn build() -> Result<(), Box<dyn std::error::Error>> {
///     let executor = ClaudeExecutor::new("claude")
///         .with_permission_mode(PermissionMode::BypassPermissions)
///         .with_allowed_tools(["Read", "Bash"])
///         .with_max_turns(50);
///
///     let _messages = executor.stream(Path::new("."), "Fix the failing test")?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ClaudeExecutor {
    /// Binary to run; a bare name is looked up on PATH.
    claude_path: String,

    permission_mode: PermissionMode,

    model: Option<String>,

    /// Maximum agent turns (optional).
    max_turns: Option<u32>,

    /// Tools the agent may use without asking.
    allowed_tools: Vec<String>,

    /// Extra directories the agent may access.
    add_dirs: Vec<PathBuf>,

    /// Setting sources to load (e.g. "project").
    setting_sources: Vec<String>,

    /// Local plugin directories to load.
    plugin_dirs: Vec<PathBuf>,

    env_vars: Vec<(String, String)>,
}

impl ClaudeExecutor {
    /// Start a builder for the given binary, e.g. `"claude"` or an absolute path.
    pub fn new(claude_path: impl Into<String>) -> Self {
        Self {
            claude_path: claude_path.into(),
            permission_mode: PermissionMode::Default,
            model: None,
            max_turns: None,
            allowed_tools: Vec::new(),
            add_dirs: Vec::new(),
            setting_sources: Vec::new(),
            plugin_dirs: Vec::new(),
            env_vars: Vec::new(),
        }
    }

    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    /// Run with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Cap the number of agent turns.
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Set the tool allow-list.
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Grant access to an additional directory.
    pub fn with_add_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.add_dirs.push(dir.into());
        self
    }

    /// Add a setting source.
    pub fn with_setting_source(mut self, source: impl Into<String>) -> Self {
        self.setting_sources.push(source.into());
        self
    }

    /// Load a local plugin directory.
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dirs.push(dir.into());
        self
    }

    /// Set an environment variable on the child process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Build the CLI invocation for one prompt.
    fn build_command(&self, working_dir: &Path, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.claude_path);

        // --print with stream-json output requires --verbose
        cmd.arg("--output-format=stream-json").arg("--verbose");

        if self.permission_mode != PermissionMode::Default {
            cmd.arg("--permission-mode")
                .arg(self.permission_mode.to_string());
        }

        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }

        if let Some(turns) = self.max_turns {
            cmd.arg("--max-turns").arg(turns.to_string());
        }

        if !self.allowed_tools.is_empty() {
            cmd.arg("--allowedTools").arg(self.allowed_tools.join(","));
        }

        for dir in &self.add_dirs {
            cmd.arg("--add-dir").arg(dir);
        }

        if !self.setting_sources.is_empty() {
            cmd.arg("--setting-sources")
                .arg(self.setting_sources.join(","));
        }

        for dir in &self.plugin_dirs {
            cmd.arg("--plugin-dir").arg(dir);
        }

        cmd.arg("--print").arg(prompt);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(working_dir);

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Spawn Claude for a prompt and stream its messages.
    ///
    /// Returns once the process is running; messages arrive on the stream
    /// as Claude prints them.
    pub fn stream(&self, working_dir: &Path, prompt: &str) -> Result<MessageStream, SdkError> {
        info!(
            claude_path = %self.claude_path,
            working_dir = %working_dir.display(),
            prompt_len = prompt.len(),
            "Preparing Claude execution"
        );

        let mut cmd = self.build_command(working_dir, prompt);
        debug!(command = ?cmd, "Claude command");

        let mut child = cmd.spawn().map_err(|e| {
            error!(error = %e, claude_path = %self.claude_path, "Could not start Claude");
            if e.kind() == std::io::ErrorKind::NotFound {
                SdkError::ClaudeNotFound(self.claude_path.clone())
            } else {
                SdkError::SpawnError(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SdkError::ProtocolError("Failed to get stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SdkError::ProtocolError("Failed to get stderr".to_string()))?;

        debug!(pid = ?child.id(), "Claude process running");

        let stderr_handle = spawn_stderr_reader(stderr);
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        tokio::spawn(read_messages(child, stdout, stderr_handle, tx));

        Ok(ReceiverStream::new(rx))
    }
}

impl Default for ClaudeExecutor {
    fn default() -> Self {
        Self::new("claude")
    }
}

/// Log stderr as it arrives; resolves to the last non-empty line.
fn spawn_stderr_reader(stderr: ChildStderr) -> JoinHandle<Option<String>> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();
        let mut last = None;
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        warn!(stderr = %trimmed, "Claude stderr");
                        last = Some(trimmed.to_string());
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error reading Claude stderr");
                    break;
                }
            }
        }
        last
    })
}

/// Forward parsed stdout messages until EOF, then report the exit status.
async fn read_messages(
    mut child: Child,
    stdout: ChildStdout,
    stderr_handle: JoinHandle<Option<String>>,
    tx: mpsc::Sender<Result<ClaudeMessage, SdkError>>,
) {
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    let mut message_count = 0u64;
    let mut saw_result = false;

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!(total_messages = message_count, "Claude stdout closed (EOF)");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                message_count += 1;
                match serde_json::from_str::<ClaudeMessage>(trimmed) {
                    Ok(message) => {
                        debug!(message_num = message_count, kind = message.kind(), "Received message from Claude");
                        saw_result |= matches!(message, ClaudeMessage::Result { .. });
                        if tx.send(Ok(message)).await.is_err() {
                            debug!("Message receiver dropped; stop forwarding");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to parse Claude message");
                        // Log first 200 chars for debugging
                        let preview: String = trimmed.chars().take(200).collect();
                        warn!(preview = %preview, "Message preview");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Error reading Claude stdout");
                let _ = tx.send(Err(SdkError::ReadError(e))).await;
                return;
            }
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, "Failed to wait for Claude process");
            let _ = tx.send(Err(SdkError::ProcessError(e.to_string()))).await;
            return;
        }
    };

    let exit_code = status.code().unwrap_or(-1);
    info!(exit_code = exit_code, success = status.success(), "Claude process exited");

    if !status.success() && !saw_result {
        let last_stderr = stderr_handle.await.ok().flatten();
        let detail = match last_stderr {
            Some(line) => format!("Claude exited with code {}: {}", exit_code, line),
            None => format!("Claude exited with code {}", exit_code),
        };
        let _ = tx.send(Err(SdkError::ProcessError(detail))).await;
    }
}
