//! Document store port
//!
//! Defines the storage boundary for tool runs and hierarchy objects.
//! Documents are JSON objects; identities are generated by the store and
//! exposed under the `_id` field.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document or a filter over documents (field equality).
pub type Document = Map<String, Value>;

/// Field holding a document's identity.
pub const ID_FIELD: &str = "_id";

/// Field holding the identity of the containing hierarchy object.
pub const PARENT_FIELD: &str = "parent";

/// Result of a conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No document matched the key; the new identity is returned.
    Inserted(String),
    /// A document already matched the key; its identity is returned.
    Existing(String),
}

impl InsertOutcome {
    pub fn id(&self) -> &str {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Existing(id) => id,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Errors from the storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found in {collection}: {id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid document in {collection}: {message}")]
    InvalidDocument { collection: String, message: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Port for document persistence.
///
/// Implementations must make [`insert_if_absent`](DocumentStore::insert_if_absent)
/// atomic: two concurrent calls with the same key produce exactly one insert.
/// [`update`](DocumentStore::update) sets only the fields present in `delta`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document whose fields equal every entry of `filter`.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Every document whose fields equal every entry of `filter`.
    async fn find_many(&self, collection: &str, filter: &Document)
    -> Result<Vec<Document>, StoreError>;

    /// Insert `document` unless a document matching `key` already exists.
    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &Document,
        document: Document,
        parent: Option<&str>,
    ) -> Result<InsertOutcome, StoreError>;

    /// Set the fields of `delta` on the document with identity `id`.
    async fn update(&self, collection: &str, id: &str, delta: Document) -> Result<(), StoreError>;

    /// Remove the document with identity `id`. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Fetch a document by identity.
    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut filter = Document::new();
        filter.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        self.find_one(collection, &filter).await
    }
}

/// True when every entry of `filter` is present with an equal value in `document`.
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, expected)| {
        document
            .get(field)
            .is_some_and(|actual| same_value(actual, expected))
    })
}

/// Equality where a number also matches its decimal text, e.g. a port stored as `80`.
fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => actual == expected,
    }
}
