//! LogSink - logs event summaries via tracing

use contracts::{ContractError, EventBody, OutputSink, ProtocolEvent};
use tracing::{info, instrument};

/// Sink that logs every event it receives
pub struct LogSink {
    name: String,
    delivered: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delivered: 0,
        }
    }

    /// Number of events logged so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    fn summary(body: &EventBody<'_>) -> String {
        match body {
            EventBody::Annotation(a) => format!("class {} {:?}", a.class_id, a.text),
            EventBody::Binary(b) => format!("class {} {} bytes", b.class_id, b.bytes.len()),
            EventBody::Meta(m) => format!("{m:?}"),
            EventBody::Packet(p) => format!("class {} {:?}", p.class_id, p.subtype),
            EventBody::Passthrough(v) => format!("{v:?}"),
        }
    }
}

impl OutputSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, event),
        fields(sink = %self.name, instance = %event.stream.instance)
    )]
    fn deliver(&mut self, event: &ProtocolEvent<'_>) -> Result<(), ContractError> {
        self.delivered += 1;
        info!(
            start_sample = event.start_sample,
            end_sample = event.end_sample,
            kind = %event.body.kind(),
            proto_id = %event.stream.proto_id,
            body = %Self::summary(&event.body),
            "Protocol event"
        );
        Ok(())
    }
}
