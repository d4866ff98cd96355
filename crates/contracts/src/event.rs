//! ProtocolEvent - typed result handed to frontend sinks
//!
//! An event lives for exactly one `put` call: it borrows the stream it was
//! published on and, for passthrough data, the caller's payload.

use bytes::Bytes;
use serde::Serialize;

use crate::{OutputKind, OutputStream, Value};

/// One converted decoder result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolEvent<'a> {
    pub start_sample: u64,
    pub end_sample: u64,
    pub stream: &'a OutputStream,
    pub body: EventBody<'a>,
}

/// Typed event payload, one variant per output kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventBody<'a> {
    Annotation(AnnotationData),
    Binary(BinaryData),
    Meta(MetaValue),
    Packet(PacketData),
    /// Unconverted payload (debug/test sinks only)
    Passthrough(&'a Value),
}

impl EventBody<'_> {
    /// Output kind this body belongs to
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Annotation(_) => OutputKind::Annotation,
            Self::Binary(_) => OutputKind::Binary,
            Self::Meta(_) => OutputKind::Meta,
            Self::Packet(_) => OutputKind::Packet,
            Self::Passthrough(_) => OutputKind::Passthrough,
        }
    }
}

/// Annotation: class index plus one or more text variants (long to short)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationData {
    pub class_id: u32,
    pub text: Vec<String>,
}

/// Binary dump: class index plus a non-empty byte run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryData {
    pub class_id: u32,
    pub bytes: Bytes,
}

/// Meta value, matching the stream's declared meta type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaValue {
    Int64(i64),
    Double(f64),
}

/// Packet output: annotation class index plus subtype
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketData {
    pub class_id: u32,
    pub subtype: PacketSubtype,
}

/// Packet output shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketSubtype {
    /// Position of a packet
    Location { packet_num: i64 },
    /// Named value inside a packet
    Field {
        packet_num: i64,
        field_name: String,
        field_value: String,
    },
}

impl PacketSubtype {
    /// Subtype code for [`PacketSubtype::Location`]
    pub const LOCATION: i64 = 0;
    /// Subtype code for [`PacketSubtype::Field`]
    pub const FIELD: i64 = 1;

    pub fn code(&self) -> i64 {
        match self {
            Self::Location { .. } => Self::LOCATION,
            Self::Field { .. } => Self::FIELD,
        }
    }

    pub fn packet_num(&self) -> i64 {
        match self {
            Self::Location { packet_num } | Self::Field { packet_num, .. } => *packet_num,
        }
    }
}
