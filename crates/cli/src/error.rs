//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// A line of the events file could not be turned into a `put`
    #[error("events line {line}: {message}")]
    ReplayLine { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn replay_line(line: usize, message: impl Into<String>) -> Self {
        Self::ReplayLine {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
