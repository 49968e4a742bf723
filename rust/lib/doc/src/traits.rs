use serde_json::Value;

use crate::error::DocError;

/// A document returned from a query: its id plus the JSON body.
#[derive(Debug, Clone)]
pub struct Doc {
    pub id: String,
    pub data: Value,
}

/// Sort specification for queries: one top-level field, asc or desc.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), descending: false }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), descending: true }
    }
}

/// One mutation in an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create or overwrite a document.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Merge top-level fields into an existing document.
    /// The batch fails (and rolls back) if the document is absent.
    Update {
        collection: String,
        id: String,
        fields: serde_json::Map<String, Value>,
    },
    /// Remove a document. No-op if absent.
    Delete { collection: String, id: String },
    /// Atomically add `delta` to a numeric top-level field, treating a
    /// missing field as 0. The batch fails if the document is absent.
    Increment {
        collection: String,
        id: String,
        field: String,
        delta: i64,
    },
}

/// DocumentStore is a schemaless, collection-oriented store.
///
/// Collections are path-like strings; subcollections are nested paths
/// (`users/{id}/courses`). Per-document operations are atomic; a
/// `batch_write` is atomic as a unit. There is no transaction spanning
/// reads and writes; callers design their workflows around that.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. Returns None if absent.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DocError>;

    /// Create a document, failing with `AlreadyExists` if the id is taken.
    /// This is the conditional write used for find-or-create patterns.
    fn create(&self, collection: &str, id: &str, data: &Value) -> Result<(), DocError>;

    /// Create or overwrite a document.
    fn set(&self, collection: &str, id: &str, data: &Value) -> Result<(), DocError>;

    /// Merge top-level fields into an existing document.
    /// Fails with `NotFound` if the document is absent.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DocError>;

    /// Remove a document. Idempotent: absent documents are a no-op.
    fn delete(&self, collection: &str, id: &str) -> Result<(), DocError>;

    /// Query a collection with equality filters on top-level fields,
    /// optional ordering and an optional result limit.
    fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        order: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Doc>, DocError>;

    /// All documents of every collection whose path ends in `/{leaf}`,
    /// or equals `leaf` exactly. Used for cross-fresher aggregates.
    fn collection_group(&self, leaf: &str) -> Result<Vec<Doc>, DocError>;

    /// Apply a set of mutations as a single all-or-nothing batch.
    fn batch_write(&self, ops: &[WriteOp]) -> Result<(), DocError>;

    /// Atomically add `delta` to a numeric top-level field of one document.
    fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), DocError>;
}
