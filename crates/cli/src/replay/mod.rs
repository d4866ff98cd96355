//! Replay of recorded decoder output through a Dispatcher

mod decoder;
mod record;

pub use decoder::TracingDecoder;
pub use record::{parse_line, ReplayEvent};

use std::io::BufRead;
use std::sync::Arc;

use contracts::StackBlueprint;
use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherError, MetricsSnapshot};
use observability::{ReplayStats, ReplaySummary};
use tracing::{info, warn};

use crate::error::Result;

/// Build a dispatcher with a TracingDecoder behind every instance
pub fn build_dispatcher(blueprint: StackBlueprint) -> std::result::Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(blueprint)
        .build(|_, definition| Box::new(TracingDecoder::new(Arc::clone(definition))))
}

/// Outcome of a replay
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub summary: ReplaySummary,
    pub dispatch: MetricsSnapshot,
}

/// Feeds events lines into `put`
pub struct Replayer {
    dispatcher: Dispatcher,
    stats: ReplayStats,
    max_events: Option<u64>,
}

impl Replayer {
    pub fn new(dispatcher: Dispatcher, max_events: Option<u64>) -> Self {
        Self {
            dispatcher,
            stats: ReplayStats::new(),
            max_events,
        }
    }

    /// Replay every line of `reader`
    ///
    /// Bad lines are logged with their line number and skipped; a `put` error
    /// is counted and does not stop the replay. Only read errors abort.
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            if self
                .max_events
                .is_some_and(|max| self.stats.total_events >= max)
            {
                info!(max_events = self.stats.total_events, "Event limit reached");
                break;
            }

            let line = line?;
            let event = match parse_line(idx + 1, &line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Skipping events line");
                    self.stats.record_skipped();
                    continue;
                }
            };

            self.replay_event(&event);
        }
        Ok(())
    }

    fn replay_event(&mut self, event: &ReplayEvent) {
        self.stats
            .record_event(&event.instance, event.start_sample, event.end_sample);

        if let Err(e) = self.dispatcher.put(
            &event.instance,
            event.start_sample,
            event.end_sample,
            event.stream_id,
            &event.payload,
        ) {
            warn!(
                instance = %event.instance,
                stream_id = event.stream_id,
                error = %e,
                "put rejected"
            );
            self.stats.record_rejected();
        }
    }

    /// Flush sinks and report
    pub fn finish(mut self) -> ReplayReport {
        self.dispatcher.flush();
        ReplayReport {
            summary: self.stats.summary(),
            dispatch: self.dispatcher.snapshot(),
        }
    }
}
