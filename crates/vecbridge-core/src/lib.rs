use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Metadata key holding a document's storage id.
pub const DOC_ID_KEY: &str = "doc_id";

/// Metadata key a search result carries its similarity score under.
pub const SCORE_KEY: &str = "score";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for every Vecbridge crate.
#[derive(Debug, Error)]
pub enum VecbridgeError {
    /// Missing or invalid configuration, raised at construction time.
    #[error("config error: {0}")]
    Config(String),
    /// The backend could not be reached (connect, timeout, broken body).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// The backend answered with a non-success status.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },
    /// A call broke the contract (length mismatch, missing `doc_id`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("parsing error: {0}")]
    Parsing(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, VecbridgeError>;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A piece of text plus free-form metadata, the unit stored in and returned by
/// a [`VectorStore`].
///
/// Documents written to a store must carry a unique string under
/// [`DOC_ID_KEY`]. Documents returned by a similarity search additionally
/// carry their relevance under [`SCORE_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    /// Create a document with a freshly generated `doc_id`.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), page_content)
    }

    /// Create a document with an explicit `doc_id`.
    pub fn with_id(doc_id: impl Into<String>, page_content: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(DOC_ID_KEY.to_string(), Value::String(doc_id.into()));
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// Create a document from existing metadata, taken as-is.
    pub fn with_metadata(page_content: impl Into<String>, metadata: HashMap<String, Value>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// Insert a single metadata field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The storage id, if present and a string.
    pub fn doc_id(&self) -> Option<&str> {
        self.metadata.get(DOC_ID_KEY).and_then(Value::as_str)
    }

    /// The similarity score attached by a search, if any.
    pub fn score(&self) -> Option<f64> {
        self.metadata.get(SCORE_KEY).and_then(Value::as_f64)
    }
}

// ---------------------------------------------------------------------------
// SearchOptions
// ---------------------------------------------------------------------------

/// Knobs for [`VectorStore::search_by_vector`] and
/// [`VectorStore::search_by_text`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results to request.
    pub top_k: usize,
    /// Results scoring below this are dropped.
    pub score_threshold: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: 0.0,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }
}

// ---------------------------------------------------------------------------
// VectorType
// ---------------------------------------------------------------------------

/// Identifies the backend behind a [`VectorStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorType {
    Upstash,
}

impl VectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorType::Upstash => "upstash",
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dataset / IndexStruct
// ---------------------------------------------------------------------------

/// Persisted description of where a dataset's vectors live.
///
/// Serialises as `{"type": "upstash", "vector_store": {"class_prefix": "..."}}`.
///
/// Only `class_prefix` is needed to locate the collection. `type` is kept as
/// free text because older datasets carry tags other than the backend that
/// wrote them (e.g. `"pgvector"`), or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStruct {
    #[serde(rename = "type", default)]
    pub vector_type: String,
    pub vector_store: VectorStoreRef,
}

/// The `vector_store` section of an [`IndexStruct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStoreRef {
    pub class_prefix: String,
}

impl IndexStruct {
    pub fn new(vector_type: VectorType, collection_name: impl Into<String>) -> Self {
        Self {
            vector_type: vector_type.as_str().to_string(),
            vector_store: VectorStoreRef {
                class_prefix: collection_name.into(),
            },
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.vector_store.class_prefix
    }
}

/// A logical dataset as seen by a [`VectorFactory`].
///
/// `index_struct` holds the raw persisted JSON, if the dataset has been
/// indexed before. Factories fill it in for fresh datasets so the caller can
/// persist it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_struct: Option<Value>,
}

impl Dataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index_struct: None,
        }
    }

    pub fn with_index_struct(mut self, index_struct: Value) -> Self {
        self.index_struct = Some(index_struct);
        self
    }

    /// Decode the persisted index struct, if any.
    pub fn index_struct(&self) -> Result<Option<IndexStruct>> {
        self.index_struct
            .as_ref()
            .map(|raw| {
                serde_json::from_value(raw.clone()).map_err(|e| {
                    VecbridgeError::Config(format!(
                        "dataset {} has a malformed index struct: {e}",
                        self.id
                    ))
                })
            })
            .transpose()
    }

    /// Deterministic collection name for a dataset id.
    pub fn gen_collection_name_by_id(dataset_id: &str) -> String {
        let normalized = dataset_id.replace('-', "_");
        format!("Vector_index_{normalized}_Node")
    }
}

// ---------------------------------------------------------------------------
// VectorStore trait
// ---------------------------------------------------------------------------

/// Uniform contract over a vector-capable backend, scoped to one collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend kind.
    fn vector_type(&self) -> VectorType;

    /// The collection (namespace) this store is bound to.
    fn collection_name(&self) -> &str;

    /// Store documents; a no-op when `documents` is empty.
    async fn create(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    /// Write one record per (document, embedding) pair, keyed by `doc_id`.
    ///
    /// Both sequences must have equal length and every document must carry a
    /// `doc_id`. Existing records with the same id are overwritten.
    async fn upsert(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    /// Whether a record with `id` is present.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Remove records by id. Unknown ids are ignored.
    async fn delete_by_ids(&self, ids: &[&str]) -> Result<()>;

    /// Remove every record whose metadata field `key` equals `value`.
    async fn delete_by_metadata_field(&self, key: &str, value: &str) -> Result<()>;

    /// Nearest neighbours of `query`, best first, each carrying a `score`.
    async fn search_by_vector(
        &self,
        query: &[f32],
        options: SearchOptions,
    ) -> Result<Vec<Document>>;

    /// Lexical search. Backends without one return an empty list.
    async fn search_by_text(&self, query: &str, options: SearchOptions) -> Result<Vec<Document>>;

    /// Drop the whole collection. Missing collections count as success.
    async fn delete_collection(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// VectorFactory trait
// ---------------------------------------------------------------------------

/// Builds a [`VectorStore`] for a dataset, deciding its collection name.
pub trait VectorFactory: Send + Sync {
    type Store: VectorStore;

    /// Bind a store to `dataset`, recording a fresh index struct on it when it
    /// had none.
    fn init_vector(&self, dataset: &mut Dataset) -> Result<Self::Store>;
}
