//! # Contracts
//!
//! Frozen interface contracts shared by the dispatcher, the config loader and
//! frontends. Business crates depend only on this crate, never on each other
//! in reverse.
//!
//! ## Sample Model
//! - Every event covers `start_sample..=end_sample` of the acquired stream
//! - Payloads are dynamic [`Value`]s until a converter turns them into an [`EventBody`]

mod blueprint;
mod decoder;
mod decoder_id;
mod error;
mod event;
mod output;
mod sink;
mod value;

pub use blueprint::*;
pub use decoder::*;
pub use decoder_id::DecoderId;
pub use error::*;
pub use event::*;
pub use output::*;
pub use sink::OutputSink;
pub use value::{Value, ValueType};
