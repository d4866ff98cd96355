//! OutputRegistry - per-instance list of registered output streams
//!
//! Append-only: stream ids are positions in the list, starting at 0, and a
//! stream is never removed or changed once registered.

use std::sync::Arc;

use contracts::{
    DecoderId, MetaInfo, MetaSpec, MetaType, OutputError, OutputKind, OutputStream, StreamId,
};
use tracing::debug;

/// Output streams of one decoder instance
#[derive(Debug)]
pub struct OutputRegistry {
    instance: DecoderId,
    streams: Vec<Arc<OutputStream>>,
}

impl OutputRegistry {
    /// Create an empty registry for `instance`
    pub fn new(instance: DecoderId) -> Self {
        Self {
            instance,
            streams: Vec::new(),
        }
    }

    /// Register a new output stream
    ///
    /// `proto_id` defaults to the instance id. `meta` is required for Meta
    /// streams and ignored for every other kind.
    ///
    /// # Errors
    /// - `InvalidMetaType` if a Meta stream lacks a meta triple or asks for a
    ///   value type other than int / float (no stream is created)
    /// - `ResourceExhausted` if the stream list cannot grow
    pub fn register(
        &mut self,
        kind: OutputKind,
        proto_id: Option<&str>,
        meta: Option<MetaSpec>,
    ) -> Result<StreamId, OutputError> {
        let meta = match kind {
            OutputKind::Meta => Some(self.validate_meta(meta)?),
            _ => None,
        };

        let stream_id =
            StreamId::try_from(self.streams.len()).map_err(|_| OutputError::ResourceExhausted {
                instance: self.instance.clone(),
                what: "output stream id",
            })?;
        self.streams
            .try_reserve(1)
            .map_err(|_| OutputError::ResourceExhausted {
                instance: self.instance.clone(),
                what: "output stream",
            })?;

        let proto_id = proto_id.unwrap_or(self.instance.as_str()).to_string();

        debug!(
            instance = %self.instance,
            stream_id,
            kind = %kind,
            proto_id = %proto_id,
            "Creating new output stream"
        );

        self.streams.push(Arc::new(OutputStream {
            stream_id,
            kind,
            instance: self.instance.clone(),
            proto_id,
            meta,
        }));

        Ok(stream_id)
    }

    fn validate_meta(&self, meta: Option<MetaSpec>) -> Result<MetaInfo, OutputError> {
        let spec = meta.ok_or_else(|| OutputError::InvalidMetaType {
            instance: self.instance.clone(),
            requested: None,
        })?;
        let meta_type =
            MetaType::from_value_type(spec.value_type).ok_or_else(|| OutputError::InvalidMetaType {
                instance: self.instance.clone(),
                requested: Some(spec.value_type),
            })?;

        Ok(MetaInfo {
            meta_type,
            name: spec.name,
            description: spec.description,
        })
    }

    /// Resolve a stream id
    pub fn get(&self, stream_id: StreamId) -> Option<&Arc<OutputStream>> {
        usize::try_from(stream_id)
            .ok()
            .and_then(|idx| self.streams.get(idx))
    }

    /// Number of registered streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Streams in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<OutputStream>> {
        self.streams.iter()
    }
}
