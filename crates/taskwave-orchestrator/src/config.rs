//! Fixed per-task execution configuration.

use std::path::{Path, PathBuf};

use taskwave_claude_sdk::PermissionMode;
use taskwave_core::TaskDescriptor;

use crate::executor::ExecutionRequest;

/// How every worker in a wave invokes the executor.
#[derive(Debug, Clone)]
pub struct WorkerProfile {
    /// Skill the agent must invoke before doing anything else.
    pub skill: String,

    /// Tools the agent may use.
    pub allowed_tools: Vec<String>,

    /// Permission mode passed to the agent.
    pub permission_mode: PermissionMode,

    /// Turn cap per task.
    pub max_turns: u32,

    /// Extra environment for the agent process.
    pub env: Vec<(String, String)>,

    /// Setting sources the agent loads.
    pub setting_sources: Vec<String>,

    /// Plugin directory, relative to the shared project directory.
    pub plugin_subdir: PathBuf,

    /// Model override.
    pub model: Option<String>,
}

impl Default for WorkerProfile {
    fn default() -> Self {
        Self {
            skill: "resolve-linear-issue".to_string(),
            allowed_tools: [
                "Read",
                "Write",
                "Edit",
                "Bash",
                "Glob",
                "Grep",
                "Task",
                "Skill",
                "WebSearch",
                "WebFetch",
                "TodoWrite",
                "ToolSearch",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            permission_mode: PermissionMode::BypassPermissions,
            max_turns: 200,
            env: vec![(
                "CLAUDE_CODE_ADDITIONAL_DIRECTORIES_CLAUDE_MD".to_string(),
                "1".to_string(),
            )],
            setting_sources: vec!["project".to_string()],
            plugin_subdir: PathBuf::from("plugins/linear-pm"),
            model: None,
        }
    }
}

impl WorkerProfile {
    /// Build the agent instructions for a task.
    pub fn build_prompt(&self, task: &TaskDescriptor) -> String {
        format!(
            r#"You must resolve Linear issue {identifier} (ID: {id}).

CRITICAL: You MUST invoke the {skill} skill using the Skill tool
BEFORE starting any implementation work. Do NOT implement steps yourself.

Use the Skill tool with skill: "{skill}" and args: "{identifier}"

The workflow is NOT complete when the PR is opened. You must continue through
PR checks, pr-reviewer review, and Linear issue update."#,
            identifier = task.identifier,
            id = task.id,
            skill = self.skill,
        )
    }

    /// Build the executor request for a task.
    pub fn request_for(&self, task: &TaskDescriptor, shared_dir: &Path) -> ExecutionRequest {
        ExecutionRequest {
            task_identifier: task.identifier.clone(),
            working_dir: task.worktree_path.clone(),
            add_dirs: vec![shared_dir.to_path_buf()],
            prompt: self.build_prompt(task),
            allowed_tools: self.allowed_tools.clone(),
            permission_mode: self.permission_mode,
            max_turns: Some(self.max_turns),
            env: self.env.clone(),
            setting_sources: self.setting_sources.clone(),
            plugin_dirs: vec![shared_dir.join(&self.plugin_subdir)],
            model: self.model.clone(),
        }
    }
}
