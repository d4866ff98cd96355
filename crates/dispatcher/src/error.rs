//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors (setup and wiring)
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Instance references a decoder definition that does not exist
    #[error("instance '{instance}' references unknown decoder '{decoder}'")]
    UnknownDecoder { instance: String, decoder: String },

    /// Instance id already in use
    #[error("decoder instance '{instance}' already exists")]
    DuplicateInstance { instance: String },

    /// Instance id not found
    #[error("decoder instance '{instance}' not found")]
    UnknownInstance { instance: String },

    /// Stacking would make output flow back into its producer
    #[error("stacking '{top}' on '{bottom}' would create a cycle")]
    StackCycle { bottom: String, top: String },

    /// register / put failure during setup
    #[error("output error: {0}")]
    Output(#[from] contracts::OutputError),

    /// Contract error
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unknown_instance(instance: impl Into<String>) -> Self {
        Self::UnknownInstance {
            instance: instance.into(),
        }
    }
}
