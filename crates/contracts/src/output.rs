//! Output streams - typed channels a decoder instance publishes on
//!
//! Streams are created by `register`, identified by a dense per-instance id
//! and never change afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DecoderId, ValueType};

/// Per-instance stream id, assigned sequentially from 0
pub type StreamId = u32;

/// Output kind of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Human-readable annotations, delivered to frontends only
    Annotation,
    /// Raw decoder data, fed to stacked decoders
    Passthrough,
    /// Binary dumps
    Binary,
    /// Scalar metadata (bitrate, sample rate, ...)
    Meta,
    /// Packet locations and fields, fed to stacked decoders and frontends
    Packet,
    /// A kind code this dispatcher does not know
    Unsupported(i32),
}

impl OutputKind {
    /// Map a numeric kind code to a kind
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Annotation,
            1 => Self::Passthrough,
            2 => Self::Binary,
            3 => Self::Meta,
            4 => Self::Packet,
            other => Self::Unsupported(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Annotation => 0,
            Self::Passthrough => 1,
            Self::Binary => 2,
            Self::Meta => 3,
            Self::Packet => 4,
            Self::Unsupported(code) => *code,
        }
    }

    /// Short label for logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Passthrough => "passthrough",
            Self::Binary => "binary",
            Self::Meta => "meta",
            Self::Packet => "packet",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(code) => write!(f, "unsupported({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Value type of a Meta stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaType {
    Int64,
    Double,
}

impl MetaType {
    /// Only `int` and `float` are valid meta value types.
    pub fn from_value_type(value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Int => Some(Self::Int64),
            ValueType::Float => Some(Self::Double),
            _ => None,
        }
    }

    /// Payload type a `put` on this stream must carry
    pub fn expected_value_type(&self) -> ValueType {
        match self {
            Self::Int64 => ValueType::Int,
            Self::Double => ValueType::Float,
        }
    }
}

/// Meta triple requested at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSpec {
    pub value_type: ValueType,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl MetaSpec {
    pub fn new(value_type: ValueType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value_type,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Validated meta description stored on a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaInfo {
    pub meta_type: MetaType,
    pub name: String,
    pub description: String,
}

/// A registered output stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputStream {
    pub stream_id: StreamId,
    pub kind: OutputKind,
    /// Owning decoder instance
    pub instance: DecoderId,
    /// Protocol id, defaults to the instance id
    pub proto_id: String,
    /// Present only on Meta streams
    pub meta: Option<MetaInfo>,
}

impl OutputStream {
    pub fn meta_type(&self) -> Option<MetaType> {
        self.meta.as_ref().map(|m| m.meta_type)
    }
}
