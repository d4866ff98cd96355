//! Dispatcher - validates, converts and routes decoder output
//!
//! `put` resolves the producing instance's stream, forwards raw data up the
//! decoder stack (passthrough, packet) and converts the payload for the
//! frontend sink registered for the stream's kind.

use std::sync::Arc;

use contracts::{
    ContractError, Decoder, DecoderId, DecoderOutput, EventBody, MetaSpec, OutputError,
    OutputKind, OutputSink, OutputStream, ProtocolEvent, SessionId, StreamId, Value,
};
use observability::metrics as obs;
use tracing::{debug, error, trace, warn};

use crate::callbacks::CallbackRegistry;
use crate::converters::{convert_annotation, convert_binary, convert_meta, convert_packet};
use crate::error::DispatcherError;
use crate::graph::{DecoderInstance, InstanceGraph};
use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Output dispatcher for a set of decoder instances
#[derive(Default)]
pub struct Dispatcher {
    graph: InstanceGraph,
    callbacks: CallbackRegistry,
    metrics: Arc<DispatchMetrics>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher with no instances and no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoder instance
    pub fn add_instance(
        &mut self,
        instance: DecoderInstance,
        decoder: Box<dyn Decoder>,
    ) -> Result<(), DispatcherError> {
        self.graph.insert(instance, decoder)
    }

    /// Feed `top` with the output of `bottom`
    pub fn stack(&mut self, bottom: &str, top: &str) -> Result<(), DispatcherError> {
        self.graph.stack(bottom, top)
    }

    /// Register a frontend sink, replacing any previous one for `(session, kind)`
    pub fn register_sink(
        &mut self,
        session: SessionId,
        kind: OutputKind,
        sink: Box<dyn OutputSink>,
    ) -> Option<Box<dyn OutputSink>> {
        self.callbacks.register_sink(session, kind, sink)
    }

    pub fn graph(&self) -> &InstanceGraph {
        &self.graph
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Flush all sinks
    pub fn flush(&mut self) {
        self.callbacks.flush_all();
    }

    /// Register an output stream on behalf of `instance`
    pub fn register(
        &mut self,
        instance: &str,
        kind: OutputKind,
        proto_id: Option<&str>,
        meta: Option<MetaSpec>,
    ) -> Result<StreamId, OutputError> {
        let inst = self
            .graph
            .get_mut(instance)
            .ok_or_else(|| OutputError::UnknownInstance {
                instance: instance.to_string(),
            })?;
        inst.outputs_mut().register(kind, proto_id, meta)
    }

    /// Publish `payload` on `stream_id` of `instance`
    ///
    /// Converter failures are logged and the event dropped, except for Meta
    /// type mismatches which are returned to the producer.
    ///
    /// # Errors
    /// - `UnknownInstance` / `UnknownStreamId`: nothing is dispatched
    /// - `Convert(TypeMismatch)` for a Meta payload of the wrong type
    pub fn put(
        &mut self,
        instance: &str,
        start_sample: u64,
        end_sample: u64,
        stream_id: StreamId,
        payload: &Value,
    ) -> Result<(), OutputError> {
        let Some(inst) = self.graph.get(instance) else {
            debug!(instance, "put(): instance not found");
            self.metrics.inc_events_rejected();
            return Err(OutputError::UnknownInstance {
                instance: instance.to_string(),
            });
        };

        let Some(stream) = inst.outputs().get(stream_id).cloned() else {
            error!(
                decoder = %inst.definition().id,
                instance,
                stream_id,
                "Protocol decoder submitted invalid output id"
            );
            self.metrics.inc_events_rejected();
            return Err(OutputError::UnknownStreamId {
                instance: inst.id().clone(),
                stream_id,
                registered: inst.outputs().len(),
            });
        };
        let definition = Arc::clone(inst.definition());
        let session = inst.session();
        let inst_id = inst.id().clone();

        trace!(
            instance = %inst_id,
            start_sample,
            end_sample,
            kind = %stream.kind,
            stream_id,
            "put"
        );
        self.metrics.inc_events_put();
        obs::record_event_put(stream.kind.as_str());

        match stream.kind {
            OutputKind::Annotation => {
                // Annotations are only fed to sinks
                if self.callbacks.contains(session, stream.kind) {
                    match convert_annotation(&definition, payload) {
                        Ok(data) => self.deliver(
                            session,
                            event(&stream, start_sample, end_sample, EventBody::Annotation(data)),
                        ),
                        Err(e) => self.conversion_failed(&inst_id, stream.kind, &e),
                    }
                }
            }
            OutputKind::Passthrough => {
                self.forward(&inst_id, start_sample, end_sample, payload);
                // Frontends normally don't take raw data; useful for testing
                if self.callbacks.contains(session, stream.kind) {
                    self.deliver(
                        session,
                        event(&stream, start_sample, end_sample, EventBody::Passthrough(payload)),
                    );
                }
            }
            OutputKind::Binary => {
                if self.callbacks.contains(session, stream.kind) {
                    match convert_binary(&definition, payload) {
                        Ok(data) => self.deliver(
                            session,
                            event(&stream, start_sample, end_sample, EventBody::Binary(data)),
                        ),
                        Err(e) => self.conversion_failed(&inst_id, stream.kind, &e),
                    }
                }
            }
            OutputKind::Meta => {
                if self.callbacks.contains(session, stream.kind) {
                    let Some(meta_type) = stream.meta_type() else {
                        error!(instance = %inst_id, stream_id, "Meta stream without meta type");
                        return Ok(());
                    };
                    match convert_meta(&definition, meta_type, payload) {
                        Ok(value) => self.deliver(
                            session,
                            event(&stream, start_sample, end_sample, EventBody::Meta(value)),
                        ),
                        Err(e) => {
                            // Surfaced to the producer instead of logged
                            self.metrics.inc_conversion_failures();
                            obs::record_conversion_failure(stream.kind.as_str(), e.reason());
                            return Err(e.into());
                        }
                    }
                }
            }
            OutputKind::Packet => {
                // Packets go up the stack and to the frontend
                self.forward(&inst_id, start_sample, end_sample, payload);
                if self.callbacks.contains(session, stream.kind) {
                    match convert_packet(&definition, payload) {
                        Ok(data) => self.deliver(
                            session,
                            event(&stream, start_sample, end_sample, EventBody::Packet(data)),
                        ),
                        Err(e) => self.conversion_failed(&inst_id, stream.kind, &e),
                    }
                }
            }
            OutputKind::Unsupported(code) => {
                error!(
                    decoder = %definition.id,
                    instance = %inst_id,
                    output_type = code,
                    "Protocol decoder submitted invalid output type"
                );
            }
        }

        Ok(())
    }

    /// Run `instance`'s decoder on `data` (session-layer entry point)
    pub fn send(
        &mut self,
        instance: &str,
        start_sample: u64,
        end_sample: u64,
        data: &Value,
    ) -> Result<(), ContractError> {
        let id = self
            .graph
            .get(instance)
            .map(|i| i.id().clone())
            .ok_or_else(|| OutputError::UnknownInstance {
                instance: instance.to_string(),
            })?;
        let mut decoder = self
            .graph
            .take_decoder(&id)
            .ok_or_else(|| ContractError::decode(instance, "instance is already decoding"))?;

        let result = decoder.decode(
            start_sample,
            end_sample,
            data,
            &mut InstanceOutput {
                dispatcher: &mut *self,
                instance: id.clone(),
            },
        );
        self.graph.restore_decoder(&id, decoder);
        result
    }

    /// Feed raw output of `from` to each downstream instance, in stacking order.
    /// A failing downstream decoder never stops delivery to the others.
    fn forward(&mut self, from: &DecoderId, start_sample: u64, end_sample: u64, payload: &Value) {
        let downstream = match self.graph.get(from) {
            Some(inst) if !inst.downstream().is_empty() => inst.downstream().to_vec(),
            _ => return,
        };

        for next in downstream {
            trace!(
                from = %from,
                instance = %next,
                start_sample,
                end_sample,
                "Sending to instance"
            );

            let Some(mut decoder) = self.graph.take_decoder(&next) else {
                error!(
                    from = %from,
                    instance = %next,
                    "Instance is already decoding, skipping (stack cycle?)"
                );
                self.metrics.inc_forward_failures();
                obs::record_forward(false);
                continue;
            };

            let result = decoder.decode(
                start_sample,
                end_sample,
                payload,
                &mut InstanceOutput {
                    dispatcher: &mut *self,
                    instance: next.clone(),
                },
            );
            self.graph.restore_decoder(&next, decoder);

            match result {
                Ok(()) => {
                    self.metrics.inc_forwarded();
                    obs::record_forward(true);
                }
                Err(e) => {
                    error!(instance = %next, error = %e, "Calling decode() failed");
                    self.metrics.inc_forward_failures();
                    obs::record_forward(false);
                }
            }
        }
    }

    fn deliver(&mut self, session: SessionId, event: ProtocolEvent<'_>) {
        let kind = event.body.kind();
        let Some(sink) = self.callbacks.find_mut(session, kind) else {
            return;
        };

        match sink.deliver(&event) {
            Ok(()) => {
                self.metrics.inc_events_delivered();
                obs::record_sink_delivery(sink.name(), true);
            }
            Err(e) => {
                warn!(sink = %sink.name(), kind = %kind, error = %e, "Sink delivery failed");
                self.metrics.inc_sink_failures();
                obs::record_sink_delivery(sink.name(), false);
            }
        }
    }

    fn conversion_failed(&self, instance: &DecoderId, kind: OutputKind, e: &contracts::ConvertError) {
        error!(instance = %instance, kind = %kind, error = %e, "Dropping malformed event");
        self.metrics.inc_conversion_failures();
        obs::record_conversion_failure(kind.as_str(), e.reason());
    }
}

fn event<'a>(
    stream: &'a OutputStream,
    start_sample: u64,
    end_sample: u64,
    body: EventBody<'a>,
) -> ProtocolEvent<'a> {
    ProtocolEvent {
        start_sample,
        end_sample,
        stream,
        body,
    }
}

/// Output handle bound to one decoding instance
pub struct InstanceOutput<'d> {
    dispatcher: &'d mut Dispatcher,
    instance: DecoderId,
}

impl DecoderOutput for InstanceOutput<'_> {
    fn instance_id(&self) -> &DecoderId {
        &self.instance
    }

    fn register(
        &mut self,
        kind: OutputKind,
        proto_id: Option<&str>,
        meta: Option<MetaSpec>,
    ) -> Result<StreamId, OutputError> {
        self.dispatcher.register(&self.instance, kind, proto_id, meta)
    }

    fn put(
        &mut self,
        start_sample: u64,
        end_sample: u64,
        stream_id: StreamId,
        payload: &Value,
    ) -> Result<(), OutputError> {
        self.dispatcher
            .put(&self.instance, start_sample, end_sample, stream_id, payload)
    }
}
