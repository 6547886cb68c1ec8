//! Tantivy implementation of the index engine capability.
//!
//! The writer lives behind a mutex so read paths can share the engine
//! while the stream runner writes. Internal metadata is cached in memory
//! and persisted as hidden `internal` documents in the same index.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use pindex_types::{EngineError, IndexEngine};

use crate::document::{internal_to_doc, stream_value_to_doc};
use crate::error::SearchError;
use crate::index::{open_or_create_index, TantivyEngineConfig};
use crate::schema::{DocType, PartitionSchema};

struct WriterState {
    /// None once the engine is closed
    writer: Option<IndexWriter>,
    /// Mutations since the last commit
    pending: usize,
    internal: HashMap<Vec<u8>, Vec<u8>>,
}

/// Tantivy-backed partition engine.
pub struct TantivyEngine {
    reader: IndexReader,
    schema: PartitionSchema,
    state: Mutex<WriterState>,
    config: TantivyEngineConfig,
}

impl TantivyEngine {
    /// Open the partition index at the configured path, creating it if needed.
    pub fn open(config: TantivyEngineConfig) -> Result<Self, SearchError> {
        let index = open_or_create_index(&config.index_path)?;
        let schema = PartitionSchema::from_schema(index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let writer = index.writer(config.writer_memory_mb * 1024 * 1024)?;

        let mut engine = Self {
            reader,
            schema,
            state: Mutex::new(WriterState {
                writer: Some(writer),
                pending: 0,
                internal: HashMap::new(),
            }),
            config,
        };
        let internal = engine.load_internal()?;
        engine.lock_state_mut().internal = internal;

        info!(
            path = ?engine.config.index_path,
            commit_every = engine.config.commit_every,
            "Opened tantivy partition engine"
        );
        Ok(engine)
    }

    /// Partition directory this engine writes to.
    pub fn path(&self) -> &Path {
        &self.config.index_path
    }

    /// Look up a committed document body by id.
    pub fn get_document(&self, id: &[u8]) -> Result<Option<Vec<u8>>, SearchError> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let query = TermQuery::new(
            Term::from_field_bytes(self.schema.doc_id, id),
            IndexRecordOption::Basic,
        );
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;

        match top_docs.first() {
            Some((_score, address)) => {
                let doc: TantivyDocument = searcher.doc(*address)?;
                Ok(doc
                    .get_first(self.schema.body)
                    .and_then(|v| v.as_bytes())
                    .map(|b| b.to_vec()))
            }
            None => Ok(None),
        }
    }

    /// Number of committed documents, excluding internal entries.
    pub fn doc_count(&self) -> Result<usize, SearchError> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.schema.doc_type, DocType::Document.as_str()),
            IndexRecordOption::Basic,
        );
        Ok(searcher.search(&query, &Count)?)
    }

    /// Commit pending changes regardless of the commit policy.
    pub fn commit(&self) -> Result<(), SearchError> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(SearchError::Closed)?;
        let opstamp = writer.commit()?;
        state.pending = 0;
        debug!(opstamp, "Committed partition changes");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state()
            .map(|state| state.writer.is_none())
            .unwrap_or(true)
    }

    fn load_internal(&self) -> Result<HashMap<Vec<u8>, Vec<u8>>, SearchError> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.schema.doc_type, DocType::Internal.as_str()),
            IndexRecordOption::Basic,
        );

        let mut internal = HashMap::new();
        for address in searcher.search(&query, &DocSetCollector)? {
            let doc: TantivyDocument = searcher.doc(address)?;
            let key = doc.get_first(self.schema.meta_key).and_then(|v| v.as_bytes());
            let value = doc.get_first(self.schema.body).and_then(|v| v.as_bytes());
            if let (Some(key), Some(value)) = (key, value) {
                internal.insert(key.to_vec(), value.to_vec());
            }
        }
        debug!(entries = internal.len(), "Loaded internal metadata");
        Ok(internal)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, WriterState>, SearchError> {
        self.state
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    fn lock_state_mut(&mut self) -> &mut WriterState {
        match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn index_document(&self, id: &[u8], doc: &[u8]) -> Result<(), SearchError> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(SearchError::Closed)?;

        // Delete existing document with same ID (for update)
        writer.delete_term(Term::from_field_bytes(self.schema.doc_id, id));
        writer.add_document(stream_value_to_doc(&self.schema, id, doc))?;

        state.pending += 1;
        if state.pending >= self.config.commit_every {
            writer.commit()?;
            state.pending = 0;
        }

        debug!(doc_id = %String::from_utf8_lossy(id), "Indexed document");
        Ok(())
    }

    fn delete_document(&self, id: &[u8]) -> Result<(), SearchError> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(SearchError::Closed)?;

        writer.delete_term(Term::from_field_bytes(self.schema.doc_id, id));

        state.pending += 1;
        if state.pending >= self.config.commit_every {
            writer.commit()?;
            state.pending = 0;
        }

        debug!(doc_id = %String::from_utf8_lossy(id), "Deleted document");
        Ok(())
    }

    fn delete_all_documents(&self) -> Result<(), SearchError> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(SearchError::Closed)?;

        writer.delete_all_documents()?;
        // Internal entries share the index, put them back.
        for (key, value) in &state.internal {
            writer.add_document(internal_to_doc(&self.schema, key, value))?;
        }
        writer.commit()?;
        state.pending = 0;

        info!(
            path = ?self.config.index_path,
            internal = state.internal.len(),
            "Deleted all documents"
        );
        Ok(())
    }

    fn write_internal(&self, key: &[u8], value: &[u8]) -> Result<(), SearchError> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(SearchError::Closed)?;

        writer.delete_term(Term::from_field_bytes(self.schema.meta_key, key));
        writer.add_document(internal_to_doc(&self.schema, key, value))?;
        writer.commit()?;
        state.pending = 0;
        state.internal.insert(key.to_vec(), value.to_vec());

        debug!(key_len = key.len(), value_len = value.len(), "Set internal metadata");
        Ok(())
    }

    fn read_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SearchError> {
        let state = self.lock_state()?;
        if state.writer.is_none() {
            return Err(SearchError::Closed);
        }
        Ok(state.internal.get(key).cloned())
    }

    fn shutdown(&self) -> Result<(), SearchError> {
        let writer = {
            let mut state = self.lock_state()?;
            state.pending = 0;
            state.writer.take()
        };

        let Some(mut writer) = writer else {
            debug!(path = ?self.config.index_path, "Engine already closed");
            return Ok(());
        };

        if let Err(e) = writer.commit() {
            warn!(path = ?self.config.index_path, error = %e, "Final commit failed");
        }
        writer.wait_merging_threads()?;

        info!(path = ?self.config.index_path, "Closed tantivy partition engine");
        Ok(())
    }
}

impl IndexEngine for TantivyEngine {
    fn index(&self, id: &[u8], doc: &[u8]) -> Result<(), EngineError> {
        Ok(self.index_document(id, doc)?)
    }

    fn delete(&self, id: &[u8]) -> Result<(), EngineError> {
        Ok(self.delete_document(id)?)
    }

    fn delete_all(&self) -> Result<(), EngineError> {
        Ok(self.delete_all_documents()?)
    }

    fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.read_internal(key)?)
    }

    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        Ok(self.write_internal(key, value)?)
    }

    fn close(&self) -> Result<(), EngineError> {
        Ok(self.shutdown()?)
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}
