//! CallbackRegistry - frontend sinks keyed by (session, output kind)
//!
//! Passed to the dispatcher explicitly; sink resolution is a plain lookup.

use std::collections::HashMap;

use contracts::{OutputKind, OutputSink, SessionId};
use tracing::{debug, warn};

/// At most one sink per (session, kind)
#[derive(Default)]
pub struct CallbackRegistry {
    sinks: HashMap<(SessionId, OutputKind), Box<dyn OutputSink>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for `(session, kind)`, returning the sink it replaced
    pub fn register_sink(
        &mut self,
        session: SessionId,
        kind: OutputKind,
        sink: Box<dyn OutputSink>,
    ) -> Option<Box<dyn OutputSink>> {
        debug!(session, kind = %kind, sink = %sink.name(), "Registering output sink");
        let previous = self.sinks.insert((session, kind), sink);
        if let Some(ref old) = previous {
            debug!(session, kind = %kind, sink = %old.name(), "Replaced previous sink");
        }
        previous
    }

    /// Whether a sink is registered for `(session, kind)`
    pub fn contains(&self, session: SessionId, kind: OutputKind) -> bool {
        self.sinks.contains_key(&(session, kind))
    }

    /// Sink registered for `(session, kind)`, if any
    pub fn find_mut(
        &mut self,
        session: SessionId,
        kind: OutputKind,
    ) -> Option<&mut Box<dyn OutputSink>> {
        self.sinks.get_mut(&(session, kind))
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Flush every sink, logging failures
    pub fn flush_all(&mut self) {
        for ((session, kind), sink) in self.sinks.iter_mut() {
            if let Err(e) = sink.flush() {
                warn!(session = *session, kind = %kind, sink = %sink.name(), error = %e, "Flush failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, ProtocolEvent};

    struct NamedSink(&'static str);

    impl OutputSink for NamedSink {
        fn name(&self) -> &str {
            self.0
        }

        fn deliver(&mut self, _event: &ProtocolEvent<'_>) -> Result<(), ContractError> {
            Ok(())
        }
    }

    #[test]
    fn test_one_sink_per_session_and_kind() {
        let mut reg = CallbackRegistry::new();
        assert!(reg
            .register_sink(0, OutputKind::Annotation, Box::new(NamedSink("a")))
            .is_none());
        let replaced = reg.register_sink(0, OutputKind::Annotation, Box::new(NamedSink("b")));
        assert_eq!(replaced.unwrap().name(), "a");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find_mut(0, OutputKind::Annotation).unwrap().name(), "b");
    }

    #[test]
    fn test_lookup_is_per_session() {
        let mut reg = CallbackRegistry::new();
        assert!(reg.is_empty());
        reg.register_sink(1, OutputKind::Binary, Box::new(NamedSink("bin")));
        assert!(reg.contains(1, OutputKind::Binary));
        assert!(!reg.contains(0, OutputKind::Binary));
        assert!(!reg.contains(1, OutputKind::Annotation));
        assert_eq!(reg.len(), 1);
    }
}
