//! Progress lines for a running wave.
//!
//! Every line is tagged with the task identifier and a timestamp. Lines are
//! advisory only; nothing parses them.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use serde::Serialize;

/// Destination for worker progress.
pub trait ProgressSink: Send + Sync {
    /// Record one line for the task with the given identifier.
    fn emit(&self, identifier: &str, message: &str);
}

/// How console progress is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressFormat {
    /// `[HH:MM:SS] [IDENT] message`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// A single progress line.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressLine<'a> {
    pub timestamp: DateTime<Local>,
    pub identifier: &'a str,
    pub message: &'a str,
}

impl<'a> ProgressLine<'a> {
    /// Create a line stamped with the current local time.
    pub fn now(identifier: &'a str, message: &'a str) -> Self {
        Self {
            timestamp: Local::now(),
            identifier,
            message,
        }
    }

    /// Render the line in the given format.
    pub fn render(&self, format: ProgressFormat) -> String {
        match format {
            ProgressFormat::Text => format!(
                "[{}] [{}] {}",
                self.timestamp.format("%H:%M:%S"),
                self.identifier,
                self.message
            ),
            ProgressFormat::Json => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

/// Writes progress to stdout, flushing after every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress {
    format: ProgressFormat,
}

impl ConsoleProgress {
    pub fn new(format: ProgressFormat) -> Self {
        Self { format }
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, identifier: &str, message: &str) {
        let line = ProgressLine::now(identifier, message).render(self.format);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}
