//! Layered error definitions
//!
//! Categorized by source: config / payload / output (register, put) / conversion / decoder / sink

use thiserror::Error;

use crate::{DecoderId, StreamId, ValueType};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Event payload could not be built from external input
    #[error("payload parse error: {message}")]
    PayloadParse { message: String },

    // ===== Output Errors =====
    /// register / put failure
    #[error(transparent)]
    Output(#[from] OutputError),

    // ===== Decoder Errors =====
    /// A decoder's decode() failed
    #[error("decoder instance '{instance}' failed: {message}")]
    Decode { instance: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(message: impl Into<String>) -> Self {
        Self::PayloadParse {
            message: message.into(),
        }
    }

    /// Create decoder failure
    pub fn decode(instance: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            instance: instance.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by `register` and `put`
#[derive(Debug, Error)]
pub enum OutputError {
    /// Calling instance is not known to the dispatcher
    #[error("decoder instance '{instance}' not found")]
    UnknownInstance { instance: String },

    /// Producer referenced a stream it never registered
    #[error("protocol decoder instance {instance} submitted invalid output id {stream_id} ({registered} registered)")]
    UnknownStreamId {
        instance: DecoderId,
        stream_id: StreamId,
        registered: usize,
    },

    /// Meta stream requested with a value type other than int / float
    #[error(
        "instance {instance} requested unsupported meta value type '{}'",
        .requested.map_or("none", |t| t.as_str())
    )]
    InvalidMetaType {
        instance: DecoderId,
        requested: Option<ValueType>,
    },

    /// Allocation failed
    #[error("instance {instance}: out of memory allocating {what}")]
    ResourceExhausted {
        instance: DecoderId,
        what: &'static str,
    },

    /// Payload failed validation (only Meta mismatches reach the producer)
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Which pre-declared class list an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Annotation,
    Binary,
}

impl std::fmt::Display for ClassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annotation => f.write_str("annotation"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// Payload validation failure
///
/// Every variant names the producing decoder so a misbehaving decoder can be
/// diagnosed from the message alone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("protocol decoder {decoder} submitted {what} with {actual} elements instead of {expected}")]
    ShapeMismatch {
        decoder: String,
        what: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("protocol decoder {decoder} submitted {what} of type '{actual}', expected {expected}")]
    TypeMismatch {
        decoder: String,
        what: &'static str,
        expected: &'static str,
        actual: ValueType,
    },

    #[error("protocol decoder {decoder} submitted data to unregistered {class} class {class_id}")]
    UnknownClassId {
        decoder: String,
        class: ClassKind,
        class_id: i64,
    },

    #[error("protocol decoder {decoder} submitted binary output with empty data set")]
    EmptyBinaryPayload { decoder: String },

    #[error("protocol decoder {decoder} submitted invalid sub type {subtype} for packet output")]
    UnknownSubtype { decoder: String, subtype: i64 },
}

impl ConvertError {
    /// Short reason label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::UnknownClassId { .. } => "unknown_class_id",
            Self::EmptyBinaryPayload { .. } => "empty_binary_payload",
            Self::UnknownSubtype { .. } => "unknown_subtype",
        }
    }

    /// Name of the decoder that produced the bad payload
    pub fn decoder(&self) -> &str {
        match self {
            Self::ShapeMismatch { decoder, .. }
            | Self::TypeMismatch { decoder, .. }
            | Self::UnknownClassId { decoder, .. }
            | Self::EmptyBinaryPayload { decoder }
            | Self::UnknownSubtype { decoder, .. } => decoder,
        }
    }
}
