//! # pindex-search
//!
//! Tantivy-backed index engine for partition indexes.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory, one directory per partition
//! - Documents keyed by id, stored body plus extracted searchable text
//! - Internal metadata persisted in the same index as hidden entries
//! - Configurable commit cadence for document mutations

pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod schema;

pub use document::{extract_text, internal_to_doc, stream_value_to_doc};
pub use engine::TantivyEngine;
pub use error::SearchError;
pub use index::{open_or_create_index, TantivyEngineConfig};
pub use schema::{build_partition_schema, DocType, PartitionSchema};
