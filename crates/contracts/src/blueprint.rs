//! StackBlueprint - Config Loader output
//!
//! Describes a complete decoder stack: decoder definitions, the instances
//! built from them (with their declared outputs and stacking links) and the
//! frontend sinks per (session, kind).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{DecoderDefinition, MetaSpec, OutputKind, SessionId};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete decoder stack blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StackBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Decoder definitions
    #[serde(default)]
    #[validate(nested)]
    pub decoders: Vec<DecoderDefinition>,

    /// Decoder instances
    #[serde(default)]
    #[validate(nested)]
    pub instances: Vec<InstanceConfig>,

    /// Frontend sinks
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

impl StackBlueprint {
    /// Find a decoder definition by id
    pub fn decoder(&self, id: &str) -> Option<&DecoderDefinition> {
        self.decoders.iter().find(|d| d.id == id)
    }

    /// Find an instance by id
    pub fn instance(&self, id: &str) -> Option<&InstanceConfig> {
        self.instances.iter().find(|i| i.id == id)
    }
}

/// Decoder instance configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InstanceConfig {
    /// Unique instance id
    #[validate(length(min = 1, message = "instance id cannot be empty"))]
    pub id: String,

    /// Decoder definition id
    #[validate(length(min = 1, message = "decoder reference cannot be empty"))]
    pub decoder: String,

    /// Owning session
    #[serde(default)]
    pub session: SessionId,

    /// Output streams, registered in this order (stream ids 0..N-1)
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,

    /// Downstream instances fed with this instance's output, in order
    #[serde(default)]
    pub stack: Vec<String>,
}

/// Declared output stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub kind: OutputKind,

    /// Protocol id (defaults to the instance id)
    #[serde(default)]
    pub proto_id: Option<String>,

    /// Required for Meta outputs
    #[serde(default)]
    pub meta: Option<MetaSpec>,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Session the sink is registered with
    #[serde(default)]
    pub session: SessionId,

    /// Output kind the sink receives
    pub kind: OutputKind,

    /// Sink type
    pub sink_type: SinkType,

    /// Type specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON lines file output
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_helpers() {
        let bp = StackBlueprint {
            decoders: vec![DecoderDefinition::new("uart")],
            instances: vec![InstanceConfig {
                id: "uart-1".into(),
                decoder: "uart".into(),
                session: 0,
                outputs: vec![],
                stack: vec![],
            }],
            ..Default::default()
        };
        assert!(bp.decoder("uart").is_some());
        assert!(bp.decoder("spi").is_none());
        assert!(bp.instance("uart-1").is_some());
    }

    #[test]
    fn test_sink_config_defaults() {
        let sink: SinkConfig =
            serde_json::from_str(r#"{"name": "ann", "kind": "annotation", "sink_type": "log"}"#)
                .unwrap();
        assert_eq!(sink.session, 0);
        assert_eq!(sink.kind, OutputKind::Annotation);
        assert!(sink.params.is_empty());
    }
}
