//! Tantivy schema for partition indexes.
//!
//! One index holds two kinds of records:
//! - documents: stream UPDATE payloads keyed by `doc_id`
//! - internal entries: metadata written by SET_META, keyed by `meta_key`

use tantivy::schema::{Field, Schema, INDEXED, STORED, STRING, TEXT};

use crate::SearchError;

/// Record kinds stored in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Document,
    Internal,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Document => "document",
            DocType::Internal => "internal",
        }
    }
}

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct PartitionSchema {
    schema: Schema,
    /// "document" or "internal" (STRING | STORED)
    pub doc_type: Field,
    /// Document id (BYTES, INDEXED | STORED)
    pub doc_id: Field,
    /// Internal metadata key (BYTES, INDEXED | STORED)
    pub meta_key: Field,
    /// Searchable text extracted from the body (TEXT)
    pub text: Field,
    /// Raw document body or metadata value (BYTES, STORED)
    pub body: Field,
}

impl PartitionSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a PartitionSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            doc_type: field("doc_type")?,
            doc_id: field("doc_id")?,
            meta_key: field("meta_key")?,
            text: field("text")?,
            body: field("body")?,
            schema,
        })
    }
}

/// Build the partition schema.
pub fn build_partition_schema() -> PartitionSchema {
    let mut schema_builder = Schema::builder();

    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let doc_id = schema_builder.add_bytes_field("doc_id", INDEXED | STORED);
    let meta_key = schema_builder.add_bytes_field("meta_key", INDEXED | STORED);
    let text = schema_builder.add_text_field("text", TEXT);
    let body = schema_builder.add_bytes_field("body", STORED);

    let schema = schema_builder.build();

    PartitionSchema {
        schema,
        doc_type,
        doc_id,
        meta_key,
        text,
        body,
    }
}
