//! Frontend sink implementations
//!
//! Contains LogSink and JsonLinesSink.

mod file;
mod log;

pub use self::file::{JsonLinesSink, JsonLinesSinkConfig};
pub use self::log::LogSink;
