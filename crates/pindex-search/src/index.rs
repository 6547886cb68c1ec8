//! Tantivy index management.
//!
//! Handles index creation and opening for one partition directory.

use std::path::{Path, PathBuf};

use tantivy::Index;
use tracing::{debug, info};

use crate::error::SearchError;
use crate::schema::build_partition_schema;

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Tantivy engine configuration
#[derive(Debug, Clone)]
pub struct TantivyEngineConfig {
    /// Partition directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
    /// Document mutations between commits
    pub commit_every: usize,
}

impl TantivyEngineConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
            commit_every: 1,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    pub fn with_commit_every(mut self, n: usize) -> Self {
        self.commit_every = n.max(1);
        self
    }
}

/// Open an existing index or create a new one.
///
/// Uses MmapDirectory for persistence. The directory is created when
/// missing, which is how a partition comes back after a rollback.
pub fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening existing partition index");
        let index = Index::open_in_dir(path)?;
        Ok(index)
    } else {
        info!(path = ?path, "Creating new partition index");
        std::fs::create_dir_all(path)?;
        let schema = build_partition_schema();
        let index = Index::create_in_dir(path, schema.schema().clone())?;
        Ok(index)
    }
}
