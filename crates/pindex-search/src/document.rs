//! Document mapping from stream payloads to Tantivy documents.

use tantivy::doc;
use tantivy::TantivyDocument;

use crate::schema::{DocType, PartitionSchema};

/// Convert an UPDATE payload to a Tantivy document.
///
/// The raw bytes are stored unchanged so the body can be read back;
/// the text field gets the searchable text from [`extract_text`].
pub fn stream_value_to_doc(schema: &PartitionSchema, id: &[u8], value: &[u8]) -> TantivyDocument {
    doc!(
        schema.doc_type => DocType::Document.as_str(),
        schema.doc_id => id.to_vec(),
        schema.text => extract_text(value),
        schema.body => value.to_vec()
    )
}

/// Convert an internal metadata entry to a Tantivy document.
pub fn internal_to_doc(schema: &PartitionSchema, key: &[u8], value: &[u8]) -> TantivyDocument {
    doc!(
        schema.doc_type => DocType::Internal.as_str(),
        schema.meta_key => key.to_vec(),
        schema.body => value.to_vec()
    )
}

/// Extract searchable text from a document body.
///
/// JSON bodies contribute every string and number leaf, in document
/// order. Anything else is indexed as (lossy) UTF-8 text.
pub fn extract_text(value: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(value) {
        Ok(json) => {
            let mut parts = Vec::new();
            collect_leaves(&json, &mut parts);
            parts.join(" ")
        }
        Err(_) => String::from_utf8_lossy(value).into_owned(),
    }
}

fn collect_leaves(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Number(n) => out.push(n.to_string()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_leaves(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_leaves(item, out);
            }
        }
        serde_json::Value::Bool(_) | serde_json::Value::Null => {}
    }
}
