//! Decoder definitions and the decoder capability consumed by the dispatcher
//!
//! A definition is loaded once (outside this workspace) and owns the fixed,
//! ordered class lists events refer to by index.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, DecoderId, MetaSpec, OutputError, OutputKind, StreamId, Value};

/// Session handle type
pub type SessionId = u32;

/// Static description of a protocol decoder
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DecoderDefinition {
    /// Unique decoder id (e.g. "uart")
    #[validate(length(min = 1, message = "decoder id cannot be empty"))]
    pub id: String,

    /// Human readable name
    #[serde(default)]
    pub name: String,

    /// Annotation classes, indexed by class id
    #[serde(default)]
    #[validate(nested)]
    pub annotation_classes: Vec<AnnotationClass>,

    /// Grouping of annotation classes for display
    #[serde(default)]
    #[validate(nested)]
    pub annotation_rows: Vec<AnnotationRow>,

    /// Binary classes, indexed by class id
    #[serde(default)]
    #[validate(nested)]
    pub binary_classes: Vec<BinaryClass>,
}

impl DecoderDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn with_annotation_class(mut self, id: &str, description: &str) -> Self {
        self.annotation_classes.push(AnnotationClass {
            id: id.to_string(),
            description: description.to_string(),
        });
        self
    }

    pub fn with_binary_class(mut self, id: &str, description: &str) -> Self {
        self.binary_classes.push(BinaryClass {
            id: id.to_string(),
            description: description.to_string(),
        });
        self
    }

    /// Look up an annotation class; negative or out-of-range ids yield None
    pub fn annotation_class(&self, class_id: i64) -> Option<&AnnotationClass> {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.annotation_classes.get(idx))
    }

    /// Look up a binary class; negative or out-of-range ids yield None
    pub fn binary_class(&self, class_id: i64) -> Option<&BinaryClass> {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.binary_classes.get(idx))
    }
}

/// Annotation class descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnnotationClass {
    #[validate(length(min = 1, message = "annotation class id cannot be empty"))]
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// Annotation row: a display group of annotation class indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnnotationRow {
    #[validate(length(min = 1, message = "annotation row id cannot be empty"))]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub classes: Vec<usize>,
}

/// Binary class descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BinaryClass {
    #[validate(length(min = 1, message = "binary class id cannot be empty"))]
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// Output handle given to a decoder while it decodes
///
/// Calls act on behalf of the decoding instance.
pub trait DecoderOutput {
    /// Id of the instance this handle publishes for
    fn instance_id(&self) -> &DecoderId;

    /// Register a new output stream, returning its id
    fn register(
        &mut self,
        kind: OutputKind,
        proto_id: Option<&str>,
        meta: Option<MetaSpec>,
    ) -> Result<StreamId, OutputError>;

    /// Publish a result on a registered stream
    fn put(
        &mut self,
        start_sample: u64,
        end_sample: u64,
        stream_id: StreamId,
        payload: &Value,
    ) -> Result<(), OutputError>;
}

/// A running protocol decoder implementation
pub trait Decoder: Send {
    /// Consume one input event (raw samples for a root decoder, the lower
    /// decoder's passthrough/packet output for a stacked one).
    ///
    /// # Errors
    /// Returned errors are logged by whoever forwarded the event; they never
    /// stop delivery to sibling decoders.
    fn decode(
        &mut self,
        start_sample: u64,
        end_sample: u64,
        data: &Value,
        out: &mut dyn DecoderOutput,
    ) -> Result<(), ContractError>;
}

impl<F> Decoder for F
where
    F: FnMut(u64, u64, &Value, &mut dyn DecoderOutput) -> Result<(), ContractError> + Send,
{
    fn decode(
        &mut self,
        start_sample: u64,
        end_sample: u64,
        data: &Value,
        out: &mut dyn DecoderOutput,
    ) -> Result<(), ContractError> {
        self(start_sample, end_sample, data, out)
    }
}
