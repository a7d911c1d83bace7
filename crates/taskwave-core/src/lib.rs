//! taskwave Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Async runtimes
//! - Subprocesses or the agent CLI
//! - Console output
//!
//! Everything here describes a wave: the tasks that go in and the
//! per-task results that come out.

pub mod error;
pub mod ids;
pub mod result;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{TaskId, WaveId};
pub use result::{WaveSummary, WorkerResult, NO_RESULT_MESSAGE};
pub use task::{TaskDescriptor, WaveConfig, DEFAULT_MAX_CONCURRENT};
