//! Index engine capability trait.
//!
//! The stream runner is the only writer of an engine. Implementations
//! must still guard their own state, because read-only query paths may
//! hold the same engine concurrently.

use crate::error::EngineError;

/// Capability the stream runner writes to.
///
/// Partial rollback would extend this trait with a `snapshot()` call
/// returning an opaque, persistable position and a `rollback_to(id)`
/// call that seeks back to it. Neither exists yet, so every rollback
/// rebuilds the partition from scratch.
pub trait IndexEngine: Send + Sync {
    /// Index a document, replacing any document with the same id.
    ///
    /// Ids are opaque bytes and compared byte for byte.
    fn index(&self, id: &[u8], doc: &[u8]) -> Result<(), EngineError>;

    /// Remove a document by id. Removing an absent id is not an error.
    fn delete(&self, id: &[u8]) -> Result<(), EngineError>;

    /// Remove every document. Internal metadata is kept.
    fn delete_all(&self) -> Result<(), EngineError>;

    /// Read an internal metadata value. Returns `Ok(None)` when unset.
    fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;

    /// Write an internal metadata value.
    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    /// Release the engine's resources.
    ///
    /// Must be idempotent: closing an already closed engine succeeds.
    fn close(&self) -> Result<(), EngineError>;

    /// Name of this engine for logging.
    fn name(&self) -> &str;
}
