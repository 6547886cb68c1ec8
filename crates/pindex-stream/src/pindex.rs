//! Partition index handle.
//!
//! Owns the partition's engine, on-disk path and the receiving half of
//! its mailbox. Producers hold [`StreamSender`] clones.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use pindex_search::{TantivyEngine, TantivyEngineConfig};
use pindex_types::{EngineError, IndexEngine, StreamError, StreamRequest, StreamSettings};

use crate::sender::StreamSender;
use crate::state::PartitionState;

/// Engine implementations a partition can be driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Tantivy,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Tantivy => "tantivy",
        }
    }

    /// Parse from string, returning None for unknown kinds.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tantivy" => Some(IndexKind::Tantivy),
            _ => None,
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One partition of the search index on this node.
pub struct PartitionIndex {
    name: String,
    index_type: String,
    path: PathBuf,
    engine: Arc<dyn IndexEngine>,
    /// Taken by the one and only runner
    stream: Mutex<Option<mpsc::Receiver<StreamRequest>>>,
    state: watch::Sender<PartitionState>,
}

impl PartitionIndex {
    /// Wrap an already opened engine.
    ///
    /// Returns the partition and the first producer handle. The mailbox
    /// closes once every clone of that handle is dropped.
    pub fn new(
        name: impl Into<String>,
        index_type: impl Into<String>,
        path: impl Into<PathBuf>,
        engine: Arc<dyn IndexEngine>,
        mailbox_capacity: usize,
    ) -> (Arc<Self>, StreamSender) {
        let name = name.into();
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let (state, _) = watch::channel(PartitionState::Starting);

        let pindex = Arc::new(Self {
            name: name.clone(),
            index_type: index_type.into(),
            path: path.into(),
            engine,
            stream: Mutex::new(Some(rx)),
            state,
        });
        (pindex, StreamSender::new(name, tx))
    }

    /// Open the engine selected by `index_type` under `settings.data_dir`.
    ///
    /// Without an explicit type, `settings.default_index_type` is used.
    pub fn open(
        name: &str,
        index_type: Option<&str>,
        settings: &StreamSettings,
    ) -> Result<(Arc<Self>, StreamSender), StreamError> {
        let index_type = index_type.unwrap_or(settings.default_index_type.as_str());
        let path = settings.partition_path(name);

        let engine: Arc<dyn IndexEngine> = match IndexKind::parse(index_type) {
            Some(IndexKind::Tantivy) => {
                let config = TantivyEngineConfig::new(&path)
                    .with_memory_mb(settings.writer_memory_mb)
                    .with_commit_every(settings.commit_every);
                let engine = TantivyEngine::open(config).map_err(EngineError::from)?;
                Arc::new(engine)
            }
            None => {
                return Err(StreamError::Config(format!(
                    "unknown index type: {}",
                    index_type
                )))
            }
        };

        info!(partition = name, index_type, path = ?path, "Opened partition index");
        Ok(Self::new(
            name,
            index_type,
            path,
            engine,
            settings.mailbox_capacity,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_type(&self) -> &str {
        &self.index_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Engine handle, for read-only query paths.
    pub fn engine(&self) -> &Arc<dyn IndexEngine> {
        &self.engine
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PartitionState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PartitionState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: PartitionState) {
        let prev = self.state.send_replace(next);
        if !prev.can_transition_to(next) {
            warn!(partition = %self.name, from = %prev, to = %next, "Unexpected state transition");
        }
        debug!(partition = %self.name, from = %prev, to = %next, "Partition state");
    }

    /// Take the mailbox receiver. Only the first caller gets it.
    pub(crate) fn take_stream(&self) -> Option<mpsc::Receiver<StreamRequest>> {
        match self.stream.lock() {
            Ok(mut stream) => stream.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Close the engine and remove the partition directory.
    ///
    /// The path is removed even when the close fails; the close error is
    /// returned afterwards. Safe to call more than once: a closed engine
    /// and a missing path are both treated as already torn down.
    pub fn teardown(&self) -> Result<(), EngineError> {
        let closed = self.engine.close();
        if let Err(e) = &closed {
            warn!(partition = %self.name, error = %e, "Engine close failed, removing path anyway");
        }
        self.remove_path()?;
        closed
    }

    fn remove_path(&self) -> Result<(), EngineError> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                info!(partition = %self.name, path = ?self.path, "Removed partition path");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(partition = %self.name, path = ?self.path, "Partition path already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for PartitionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionIndex")
            .field("name", &self.name)
            .field("index_type", &self.index_type)
            .field("path", &self.path)
            .field("engine", &self.engine.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_kind_parse() {
        assert_eq!(IndexKind::parse("tantivy"), Some(IndexKind::Tantivy));
        assert_eq!(IndexKind::parse("bleve"), None);
        assert_eq!(IndexKind::Tantivy.to_string(), "tantivy");
    }

    #[test]
    fn test_open_unknown_index_type() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StreamSettings {
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let result = PartitionIndex::open("p0", Some("bleve"), &settings);
        assert!(matches!(result, Err(StreamError::Config(_))));
        assert!(!temp_dir.path().join("p0").exists());
    }

    #[test]
    fn test_open_and_teardown_twice() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StreamSettings {
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let (pindex, _sender) = PartitionIndex::open("p0", Some("tantivy"), &settings).unwrap();
        assert_eq!(pindex.state(), PartitionState::Starting);
        assert!(pindex.path().exists());

        pindex.teardown().unwrap();
        assert!(!pindex.path().exists());
        pindex.teardown().unwrap();
    }

    #[test]
    fn test_stream_taken_once() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StreamSettings {
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let (pindex, _sender) = PartitionIndex::open("p0", Some("tantivy"), &settings).unwrap();
        assert!(pindex.take_stream().is_some());
        assert!(pindex.take_stream().is_none());
        pindex.teardown().unwrap();
    }

    #[test]
    fn test_open_uses_default_index_type() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StreamSettings {
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let (pindex, _sender) = PartitionIndex::open("p0", None, &settings).unwrap();
        assert_eq!(pindex.index_type(), "tantivy");
        assert_eq!(pindex.engine().name(), "tantivy");
        pindex.teardown().unwrap();

        let settings = StreamSettings {
            default_index_type: "bleve".to_string(),
            ..settings
        };
        let result = PartitionIndex::open("p1", None, &settings);
        assert!(matches!(result, Err(StreamError::Config(_))));
    }
}
