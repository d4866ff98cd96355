//! Decoder used for every instance during replay

use std::sync::Arc;

use contracts::{ContractError, Decoder, DecoderDefinition, DecoderOutput, Value};
use tracing::debug;

/// Logs the data it is fed and publishes nothing
///
/// Replay has no signal to decode; this makes forwarding visible at debug level.
pub struct TracingDecoder {
    definition: Arc<DecoderDefinition>,
    received: u64,
}

impl TracingDecoder {
    pub fn new(definition: Arc<DecoderDefinition>) -> Self {
        Self {
            definition,
            received: 0,
        }
    }
}

impl Decoder for TracingDecoder {
    fn decode(
        &mut self,
        start_sample: u64,
        end_sample: u64,
        data: &Value,
        out: &mut dyn DecoderOutput,
    ) -> Result<(), ContractError> {
        self.received += 1;
        debug!(
            instance = %out.instance_id(),
            decoder = %self.definition.id,
            start_sample,
            end_sample,
            data_type = %data.value_type(),
            received = self.received,
            "Stacked decoder received data"
        );
        Ok(())
    }
}
