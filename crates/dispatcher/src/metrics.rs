//! Dispatch counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Accepted put calls (stream resolved)
    events_put: AtomicU64,
    /// put calls rejected before dispatch (unknown instance / stream id)
    events_rejected: AtomicU64,
    /// Events handed to a sink successfully
    events_delivered: AtomicU64,
    /// Payloads that failed conversion
    conversion_failures: AtomicU64,
    /// Successful downstream decode calls
    forwarded: AtomicU64,
    /// Failed or skipped downstream decode calls
    forward_failures: AtomicU64,
    /// Sink deliver errors
    sink_failures: AtomicU64,
}

macro_rules! counter {
    ($get:ident, $inc:ident) => {
        pub fn $get(&self) -> u64 {
            self.$get.load(Ordering::Relaxed)
        }

        pub fn $inc(&self) {
            self.$get.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    counter!(events_put, inc_events_put);
    counter!(events_rejected, inc_events_rejected);
    counter!(events_delivered, inc_events_delivered);
    counter!(conversion_failures, inc_conversion_failures);
    counter!(forwarded, inc_forwarded);
    counter!(forward_failures, inc_forward_failures);
    counter!(sink_failures, inc_sink_failures);

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_put: self.events_put(),
            events_rejected: self.events_rejected(),
            events_delivered: self.events_delivered(),
            conversion_failures: self.conversion_failures(),
            forwarded: self.forwarded(),
            forward_failures: self.forward_failures(),
            sink_failures: self.sink_failures(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub events_put: u64,
    pub events_rejected: u64,
    pub events_delivered: u64,
    pub conversion_failures: u64,
    pub forwarded: u64,
    pub forward_failures: u64,
    pub sink_failures: u64,
}
