//! Fault taxonomy
//!
//! Typed faults raised by the orchestration layer. Timeouts and assertion
//! failures are not faults and never appear here.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Faults that abort a run or the whole invocation
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Precondition failed: {what} not found at {}", .path.display())]
    Precondition { what: &'static str, path: PathBuf },

    #[error("Test script error in {test}: {location}")]
    ScriptFault { test: String, location: ScriptLocation },

    #[error("Coordinator overflow: cohort capacity is {capacity}")]
    CoordinatorOverflow { capacity: usize },

    #[error("Coordinator exhausted: all {capacity} environments already consumed")]
    CoordinatorExhausted { capacity: usize },
}

impl FanoutError {
    pub fn config(message: impl Into<String>) -> Self {
        FanoutError::Config(message.into())
    }
}

/// A test-script error as the engine reported it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptLocation {
    /// Error class, e.g. `TypeError`
    pub name: Option<String>,
    /// Message text, unchanged
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u64>,
    pub stack: Option<String>,
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{name}: {}", self.message)?,
            _ => write!(f, "{}", self.message)?,
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " ({file}:{line})"),
            (Some(file), None) => write!(f, " ({file})"),
            (None, Some(line)) => write!(f, " (line {line})"),
            (None, None) => Ok(()),
        }
    }
}
