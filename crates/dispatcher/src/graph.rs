//! InstanceGraph - decoder instances and their stacking links
//!
//! Each instance forwards its passthrough and packet output to its downstream
//! instances in the order they were stacked. The graph must stay acyclic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use contracts::{Decoder, DecoderDefinition, DecoderId, SessionId};
use tracing::debug;

use crate::error::DispatcherError;
use crate::registry::OutputRegistry;

/// One running decoder instance
#[derive(Debug)]
pub struct DecoderInstance {
    id: DecoderId,
    definition: Arc<DecoderDefinition>,
    session: SessionId,
    outputs: OutputRegistry,
    downstream: Vec<DecoderId>,
}

impl DecoderInstance {
    pub fn new(
        id: impl Into<DecoderId>,
        definition: Arc<DecoderDefinition>,
        session: SessionId,
    ) -> Self {
        let id = id.into();
        Self {
            outputs: OutputRegistry::new(id.clone()),
            id,
            definition,
            session,
            downstream: Vec::new(),
        }
    }

    pub fn id(&self) -> &DecoderId {
        &self.id
    }

    pub fn definition(&self) -> &Arc<DecoderDefinition> {
        &self.definition
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut OutputRegistry {
        &mut self.outputs
    }

    /// Downstream instances in forwarding order
    pub fn downstream(&self) -> &[DecoderId] {
        &self.downstream
    }
}

struct InstanceSlot {
    instance: DecoderInstance,
    /// `None` while the decoder is running
    decoder: Option<Box<dyn Decoder>>,
}

/// All decoder instances known to a dispatcher
#[derive(Default)]
pub struct InstanceGraph {
    slots: HashMap<DecoderId, InstanceSlot>,
    order: Vec<DecoderId>,
}

impl InstanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance together with its decoder implementation
    pub fn insert(
        &mut self,
        instance: DecoderInstance,
        decoder: Box<dyn Decoder>,
    ) -> Result<(), DispatcherError> {
        if self.slots.contains_key(instance.id.as_str()) {
            return Err(DispatcherError::DuplicateInstance {
                instance: instance.id.to_string(),
            });
        }

        debug!(
            instance = %instance.id,
            decoder = %instance.definition.id,
            session = instance.session,
            "Adding decoder instance"
        );

        let id = instance.id.clone();
        self.order.push(id.clone());
        self.slots.insert(
            id,
            InstanceSlot {
                instance,
                decoder: Some(decoder),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&DecoderInstance> {
        self.slots.get(id).map(|slot| &slot.instance)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DecoderInstance> {
        self.slots.get_mut(id).map(|slot| &mut slot.instance)
    }

    /// Stack `top` on `bottom`: `bottom`'s output is fed to `top`
    pub fn stack(&mut self, bottom: &str, top: &str) -> Result<(), DispatcherError> {
        let top_id = self
            .get(top)
            .map(|i| i.id.clone())
            .ok_or_else(|| DispatcherError::unknown_instance(top))?;
        if self.get(bottom).is_none() {
            return Err(DispatcherError::unknown_instance(bottom));
        }

        if bottom == top || self.reaches(top, bottom) {
            return Err(DispatcherError::StackCycle {
                bottom: bottom.to_string(),
                top: top.to_string(),
            });
        }

        debug!(bottom, top, "Stacking decoder instance");

        if let Some(slot) = self.slots.get_mut(bottom) {
            slot.instance.downstream.push(top_id);
        }
        Ok(())
    }

    /// Whether output of `from` can reach `to`
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![from];

        while let Some(id) = pending.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(instance) = self.get(id) {
                pending.extend(instance.downstream.iter().map(DecoderId::as_str));
            }
        }
        false
    }

    /// Check the decoder out for a decode call
    ///
    /// Returns `None` if the instance is unknown or already decoding.
    pub fn take_decoder(&mut self, id: &str) -> Option<Box<dyn Decoder>> {
        self.slots.get_mut(id).and_then(|slot| slot.decoder.take())
    }

    /// Return a decoder checked out with [`take_decoder`](Self::take_decoder)
    pub fn restore_decoder(&mut self, id: &str, decoder: Box<dyn Decoder>) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.decoder = Some(decoder);
        }
    }

    /// Instances in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DecoderInstance> {
        self.order.iter().filter_map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
