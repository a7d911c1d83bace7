//! Loading the wave batch descriptor.
//!
//! The batch is a JSON object with `issues`, `main_project_dir` and an
//! optional `max_concurrent`, read from a file or from stdin.

use std::io::Read;
use std::path::Path;

use taskwave_core::{CoreError, WaveConfig};
use thiserror::Error;
use tracing::debug;

/// Errors raised before any task starts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read batch input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Parse and validate a batch descriptor.
pub fn parse_wave_config(raw: &str) -> Result<WaveConfig, InputError> {
    let config: WaveConfig = serde_json::from_str(raw)?;
    config.validate()?;
    debug!(
        tasks = config.issues.len(),
        max_concurrent = config.max_concurrent,
        "Parsed batch"
    );
    Ok(config)
}

/// Read the batch from `path`, or from stdin when no path is given.
pub fn load_wave_config(path: Option<&Path>) -> Result<WaveConfig, InputError> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    parse_wave_config(&raw)
}
