//! # Dispatcher
//!
//! Routes protocol decoder output.
//!
//! Responsibilities:
//! - Register typed output streams per decoder instance
//! - Validate and convert `put` payloads into typed events
//! - Forward raw output up the decoder stack
//! - Deliver converted events to the frontend sink per (session, kind)

pub mod builder;
pub mod callbacks;
pub mod converters;
pub mod dispatcher;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod registry;
pub mod sinks;

pub use builder::{DispatcherBuilder, create_dispatcher, create_sink};
pub use callbacks::CallbackRegistry;
pub use contracts::{Decoder, DecoderOutput, OutputSink, ProtocolEvent};
pub use dispatcher::{Dispatcher, InstanceOutput};
pub use error::DispatcherError;
pub use graph::{DecoderInstance, InstanceGraph};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use registry::OutputRegistry;
pub use sinks::{JsonLinesSink, JsonLinesSinkConfig, LogSink};
