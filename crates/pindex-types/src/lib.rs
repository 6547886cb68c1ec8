//! # pindex-types
//!
//! Shared types for partition index stream processing.
//!
//! - [`StreamOp`] and [`StreamRequest`]: the unit of work a partition
//!   mailbox carries, with its completion and metadata reply conduits
//! - [`IndexEngine`]: the capability a partition runner writes to
//! - [`StreamError`] / [`EngineError`]: errors seen by producers and
//!   returned by engines
//! - [`StreamSettings`]: layered configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod op;
pub mod request;

pub use config::StreamSettings;
pub use engine::IndexEngine;
pub use error::{EngineError, StreamError};
pub use op::StreamOp;
pub use request::{DoneReceiver, DoneSender, MetaReceiver, MetaSender, StreamRequest};
