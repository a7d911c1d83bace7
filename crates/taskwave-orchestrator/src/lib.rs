//! taskwave orchestrator
//!
//! Runs a wave of independent agent tasks under a concurrency cap and
//! returns one result per task, in input order.
//!
//! - [`Limiter`] bounds how many workers run at once.
//! - [`Worker`] drives a [`TaskExecutor`] for one task and folds every
//!   outcome into a [`WorkerResult`](taskwave_core::WorkerResult).
//! - [`WaveCoordinator`] fans tasks out and joins them back in order.

pub mod claude;
pub mod config;
pub mod coordinator;
pub mod executor;
pub mod input;
pub mod limiter;
pub mod progress;
pub mod report;
pub mod worker;

#[cfg(test)]
mod testing;

pub use claude::ClaudeTaskExecutor;
pub use config::WorkerProfile;
pub use coordinator::WaveCoordinator;
pub use executor::{AgentEvent, EventStream, ExecutionRequest, ExecutorError, TaskExecutor};
pub use input::{load_wave_config, parse_wave_config, InputError};
pub use limiter::{Limiter, LimiterPermit};
pub use progress::{ConsoleProgress, ProgressFormat, ProgressLine, ProgressSink};
pub use worker::Worker;
