//! Error types shared by partition index components.

use thiserror::Error;

use crate::op::StreamOp;

/// Errors returned by an index engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has been closed and no longer accepts operations
    #[error("Engine is closed")]
    Closed,

    /// IO error against the partition directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document body could not be converted for indexing
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Error reported by the backing index library
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors delivered to stream producers.
///
/// This is the payload of a request's completion conduit, so every
/// variant must make sense to the producer that sent the request.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The engine rejected the operation
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The request reached a partition that has already been retired
    #[error("Partition already done: {partition}, op: {op}")]
    AlreadyDone { partition: String, op: StreamOp },

    /// The mailbox is closed or the runner went away before replying
    #[error("Stream closed: {0}")]
    Closed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    /// Whether this error reports a retired partition.
    pub fn is_already_done(&self) -> bool {
        matches!(self, StreamError::AlreadyDone { .. })
    }
}
