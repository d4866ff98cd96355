//! DispatcherBuilder - wires a Dispatcher from a StackBlueprint

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{
    Decoder, DecoderDefinition, InstanceConfig, OutputSink, SinkConfig, SinkType, StackBlueprint,
};
use tracing::{debug, info, instrument};

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;
use crate::graph::DecoderInstance;
use crate::sinks::{JsonLinesSink, LogSink};

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    blueprint: StackBlueprint,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(blueprint: StackBlueprint) -> Self {
        Self { blueprint }
    }

    /// Build the dispatcher
    ///
    /// `factory` supplies the decoding logic for each instance. Declared
    /// outputs are registered in order, so they receive stream ids 0..N-1
    /// before the decoder registers anything itself.
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self, factory),
        fields(
            instances = self.blueprint.instances.len(),
            sinks = self.blueprint.sinks.len()
        )
    )]
    pub fn build<F>(self, mut factory: F) -> Result<Dispatcher, DispatcherError>
    where
        F: FnMut(&InstanceConfig, &Arc<DecoderDefinition>) -> Box<dyn Decoder>,
    {
        let definitions: HashMap<&str, Arc<DecoderDefinition>> = self
            .blueprint
            .decoders
            .iter()
            .map(|d| (d.id.as_str(), Arc::new(d.clone())))
            .collect();

        let mut dispatcher = Dispatcher::new();

        for cfg in &self.blueprint.instances {
            let definition = definitions.get(cfg.decoder.as_str()).ok_or_else(|| {
                DispatcherError::UnknownDecoder {
                    instance: cfg.id.clone(),
                    decoder: cfg.decoder.clone(),
                }
            })?;
            let decoder = factory(cfg, definition);
            dispatcher.add_instance(
                DecoderInstance::new(cfg.id.as_str(), Arc::clone(definition), cfg.session),
                decoder,
            )?;

            for output in &cfg.outputs {
                let stream_id = dispatcher.register(
                    &cfg.id,
                    output.kind,
                    output.proto_id.as_deref(),
                    output.meta.clone(),
                )?;
                debug!(instance = %cfg.id, stream_id, kind = %output.kind, "Declared output");
            }
        }

        // Links need every instance in place
        for cfg in &self.blueprint.instances {
            for top in &cfg.stack {
                dispatcher.stack(&cfg.id, top)?;
            }
        }

        for sink_cfg in &self.blueprint.sinks {
            let sink = create_sink(sink_cfg)?;
            if dispatcher
                .register_sink(sink_cfg.session, sink_cfg.kind, sink)
                .is_some()
            {
                debug!(sink = %sink_cfg.name, "Replaced previously registered sink");
            }
        }

        info!(
            instances = dispatcher.graph().len(),
            sinks = dispatcher.callbacks().len(),
            "Dispatcher ready"
        );
        Ok(dispatcher)
    }
}

/// Create a sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn OutputSink>, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = JsonLinesSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// Convenience function to build a dispatcher from a blueprint
pub fn create_dispatcher<F>(
    blueprint: StackBlueprint,
    factory: F,
) -> Result<Dispatcher, DispatcherError>
where
    F: FnMut(&InstanceConfig, &Arc<DecoderDefinition>) -> Box<dyn Decoder>,
{
    DispatcherBuilder::new(blueprint).build(factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ContractError, DecoderOutput, MetaSpec, OutputConfig, OutputKind, Value, ValueType,
    };
    use tempfile::tempdir;

    fn noop(_: &InstanceConfig, _: &Arc<DecoderDefinition>) -> Box<dyn Decoder> {
        Box::new(
            |_: u64, _: u64, _: &Value, _: &mut dyn DecoderOutput| -> Result<(), ContractError> {
                Ok(())
            },
        )
    }

    fn instance(id: &str, decoder: &str, stack: &[&str]) -> InstanceConfig {
        InstanceConfig {
            id: id.into(),
            decoder: decoder.into(),
            session: 0,
            outputs: vec![],
            stack: stack.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn blueprint() -> StackBlueprint {
        let mut lower = instance("uart-1", "uart", &["midi-1"]);
        lower.outputs = vec![
            OutputConfig {
                kind: OutputKind::Annotation,
                proto_id: None,
                meta: None,
            },
            OutputConfig {
                kind: OutputKind::Passthrough,
                proto_id: Some("uart".into()),
                meta: None,
            },
            OutputConfig {
                kind: OutputKind::Meta,
                proto_id: None,
                meta: Some(MetaSpec::new(ValueType::Int, "bitrate", "Bitrate")),
            },
        ];
        StackBlueprint {
            decoders: vec![DecoderDefinition::new("uart"), DecoderDefinition::new("midi")],
            instances: vec![lower, instance("midi-1", "midi", &[])],
            sinks: vec![SinkConfig {
                name: "log".into(),
                session: 0,
                kind: OutputKind::Annotation,
                sink_type: SinkType::Log,
                params: HashMap::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_registers_declared_outputs() {
        let mut seen = Vec::new();
        let dispatcher = DispatcherBuilder::new(blueprint())
            .build(|cfg, def| {
                seen.push((cfg.id.clone(), def.id.clone()));
                noop(cfg, def)
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("uart-1".to_string(), "uart".to_string()),
                ("midi-1".to_string(), "midi".to_string()),
            ]
        );

        let uart = dispatcher.graph().get("uart-1").unwrap();
        let kinds: Vec<_> = uart.outputs().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![OutputKind::Annotation, OutputKind::Passthrough, OutputKind::Meta]
        );
        assert_eq!(uart.outputs().get(0).unwrap().proto_id, "uart-1");
        assert_eq!(uart.outputs().get(1).unwrap().proto_id, "uart");
        assert_eq!(uart.downstream().len(), 1);
        assert_eq!(uart.downstream()[0], "midi-1");
        assert!(dispatcher.callbacks().contains(0, OutputKind::Annotation));
    }

    #[test]
    fn test_unknown_decoder() {
        let mut bp = blueprint();
        bp.instances[1].decoder = "spi".into();
        let err = DispatcherBuilder::new(bp).build(noop).unwrap_err();
        assert!(matches!(err, DispatcherError::UnknownDecoder { .. }));
    }

    #[test]
    fn test_unknown_stack_target() {
        let mut bp = blueprint();
        bp.instances[0].stack.push("ghost".into());
        let err = create_dispatcher(bp, noop).unwrap_err();
        assert!(matches!(err, DispatcherError::UnknownInstance { .. }));
    }

    #[test]
    fn test_meta_output_without_meta_spec() {
        let mut bp = blueprint();
        bp.instances[0].outputs[2].meta = None;
        let err = create_dispatcher(bp, noop).unwrap_err();
        assert!(matches!(err, DispatcherError::Output(_)));
    }

    #[test]
    fn test_file_sink_creation() {
        let dir = tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert(
            "path".to_string(),
            dir.path().join("events.jsonl").display().to_string(),
        );
        let config = SinkConfig {
            name: "file".into(),
            session: 0,
            kind: OutputKind::Binary,
            sink_type: SinkType::File,
            params,
        };

        let sink = create_sink(&config).unwrap();
        assert_eq!(sink.name(), "file");
        assert!(dir.path().join("events.jsonl").exists());
    }
}
