//! Task descriptors and wave configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CoreError, TaskId};

/// Concurrency cap used when the batch does not specify one.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// One unit of work handed to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Stable unique identifier.
    pub id: TaskId,

    /// Human-readable identifier used to tag progress lines (e.g. `ENG-123`).
    pub identifier: String,

    /// Title shown in the wave banner.
    #[serde(default)]
    pub title: String,

    /// Working directory the executor runs in.
    #[serde(alias = "working_dir")]
    pub worktree_path: PathBuf,
}

impl TaskDescriptor {
    /// Create a new TaskDescriptor.
    pub fn new(
        id: impl Into<TaskId>,
        identifier: impl Into<String>,
        worktree_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            identifier: identifier.into(),
            title: String::new(),
            worktree_path: worktree_path.into(),
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A batch of tasks dispatched together under one concurrency cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Tasks in dispatch order; results come back in this order.
    #[serde(alias = "tasks")]
    pub issues: Vec<TaskDescriptor>,

    /// Context shared read-only by every task (the main project checkout).
    #[serde(alias = "shared_dir")]
    pub main_project_dir: PathBuf,

    /// Maximum number of tasks executing at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl WaveConfig {
    /// Create a new WaveConfig with the default concurrency cap.
    pub fn new(issues: Vec<TaskDescriptor>, main_project_dir: impl Into<PathBuf>) -> Self {
        Self {
            issues,
            main_project_dir: main_project_dir.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Builder method to set the concurrency cap.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Check the fields the coordinator relies on for dispatch.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_concurrent == 0 {
            return Err(CoreError::InvalidInput(
                "max_concurrent must be a positive integer".to_string(),
            ));
        }

        for (index, task) in self.issues.iter().enumerate() {
            if task.id.as_str().is_empty() {
                return Err(CoreError::InvalidInput(format!(
                    "issue at index {} has an empty id",
                    index
                )));
            }
            if task.identifier.is_empty() {
                return Err(CoreError::InvalidInput(format!(
                    "issue '{}' has an empty identifier",
                    task.id
                )));
            }
        }

        Ok(())
    }
}
