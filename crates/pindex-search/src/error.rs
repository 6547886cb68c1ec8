//! Search error types.

use pindex_types::EngineError;
use thiserror::Error;

/// Errors that can occur in the tantivy engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Writer lock poisoned
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// The engine was closed
    #[error("Index is closed")]
    Closed,
}

impl From<SearchError> for EngineError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Io(e) => EngineError::Io(e),
            SearchError::Closed => EngineError::Closed,
            other => EngineError::Backend(other.to_string()),
        }
    }
}
