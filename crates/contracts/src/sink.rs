//! OutputSink trait - frontend side of the dispatcher
//!
//! Defines the abstract interface for sinks registered per (session, kind).

use crate::{ContractError, ProtocolEvent};

/// Frontend callback receiving converted events
///
/// The event is only valid for the duration of the call; sinks that keep
/// data must copy it.
pub trait OutputSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one event
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn deliver(&mut self, event: &ProtocolEvent<'_>) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
