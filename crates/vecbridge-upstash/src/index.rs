use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vecbridge_core::{Result, VecbridgeError};

/// Upper bound on `topK` for a single Upstash query.
pub const MAX_FILTER_QUERY_TOP_K: usize = 1000;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A record as written to, or fetched from, the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// A query hit: a record plus its similarity score (higher is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Metadata filter understood by every [`VectorIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    /// Exact equality of a metadata field with a string value.
    Eq { key: String, value: String },
}

impl MetadataFilter {
    /// Equality filter on `key`.
    ///
    /// `key` is spliced into the filter expression unquoted, so it must be a
    /// field path: ASCII letters, digits, `_`, `.` and `[`/`]` only.
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if !is_field_path(&key) {
            return Err(VecbridgeError::InvalidArgument(format!(
                "invalid metadata field name {key:?}"
            )));
        }
        Ok(Self::Eq {
            key,
            value: value.into(),
        })
    }

    /// Render in the Upstash filter language, e.g. `doc_type = 'faq'`.
    pub fn to_upstash(&self) -> String {
        match self {
            Self::Eq { key, value } => {
                let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
                format!("{key} = '{escaped}'")
            }
        }
    }

    /// Evaluate against a record's metadata. Only string values can equal a
    /// quoted literal, so `page = '3'` does not match `{"page": 3}`.
    pub fn matches(&self, metadata: Option<&HashMap<String, Value>>) -> bool {
        match self {
            Self::Eq { key, value } => matches!(
                metadata.and_then(|m| m.get(key)),
                Some(Value::String(s)) if s == value
            ),
        }
    }
}

fn is_field_path(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// One similarity and/or filter query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    /// Query vector. `None` means a filter-only query, where ranking does not
    /// matter.
    pub vector: Option<Vec<f32>>,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
    pub include_vectors: bool,
    pub include_metadata: bool,
    pub include_data: bool,
}

impl QueryRequest {
    /// Nearest `top_k` neighbours of `vector`.
    pub fn by_vector(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector: Some(vector),
            top_k,
            ..Self::default()
        }
    }

    /// Up to `top_k` records matching `filter`, in no particular order.
    pub fn by_filter(filter: MetadataFilter, top_k: usize) -> Self {
        Self {
            top_k,
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }

    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    pub fn with_data(mut self) -> Self {
        self.include_data = true;
        self
    }
}

// ---------------------------------------------------------------------------
// VectorIndex trait
// ---------------------------------------------------------------------------

/// The narrow set of index operations the Upstash adapter is built on.
///
/// Every call is scoped to a namespace; the empty string is the index's
/// default namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite records by id.
    async fn upsert(&self, records: Vec<IndexRecord>, namespace: &str) -> Result<()>;

    /// Look up records by id. The result has one slot per requested id,
    /// `None` where the id is unknown.
    async fn fetch(&self, ids: &[&str], namespace: &str) -> Result<Vec<Option<IndexRecord>>>;

    /// Run a similarity and/or filter query, best hit first.
    async fn query(&self, request: QueryRequest, namespace: &str) -> Result<Vec<ScoredRecord>>;

    /// Delete records by id, returning how many existed.
    async fn delete(&self, ids: &[&str], namespace: &str) -> Result<usize>;

    /// Drop a whole namespace.
    async fn delete_namespace(&self, namespace: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn filter_renders_upstash_syntax() {
        assert_eq!(
            MetadataFilter::eq("document_id", "abc").unwrap().to_upstash(),
            "document_id = 'abc'"
        );
    }

    #[test]
    fn filter_escapes_quotes() {
        assert_eq!(
            MetadataFilter::eq("title", "it's").unwrap().to_upstash(),
            "title = 'it\\'s'"
        );
    }

    #[test]
    fn filter_accepts_field_paths() {
        for key in ["document_id", "meta.author", "tags[0]", "Page2"] {
            assert!(MetadataFilter::eq(key, "x").is_ok(), "{key}");
        }
    }

    #[test]
    fn filter_rejects_expression_keys() {
        for key in ["", "x = 'a' OR doc_id", "a b", "k'", "k=v", "a\\b"] {
            let err = MetadataFilter::eq(key, "x").unwrap_err();
            assert!(
                matches!(err, VecbridgeError::InvalidArgument(_)),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn filter_matches_strings_only() {
        let mut metadata = HashMap::new();
        metadata.insert("kind".to_string(), json!("faq"));
        metadata.insert("page".to_string(), json!(3));
        metadata.insert("draft".to_string(), json!(false));

        let eq = |key: &str, value: &str| MetadataFilter::eq(key, value).unwrap();
        assert!(eq("kind", "faq").matches(Some(&metadata)));
        assert!(!eq("kind", "blog").matches(Some(&metadata)));
        assert!(!eq("page", "3").matches(Some(&metadata)));
        assert!(!eq("draft", "false").matches(Some(&metadata)));
        assert!(!eq("missing", "x").matches(Some(&metadata)));
        assert!(!eq("kind", "faq").matches(None));
    }

    #[test]
    fn query_builders() {
        let request = QueryRequest::by_vector(vec![1.0, 0.0], 4)
            .with_metadata()
            .with_data();
        assert_eq!(request.vector.as_deref(), Some(&[1.0, 0.0][..]));
        assert_eq!(request.top_k, 4);
        assert!(request.include_metadata && request.include_data);
        assert!(!request.include_vectors);
        assert!(request.filter.is_none());

        let filter = MetadataFilter::eq("k", "v").unwrap();
        let request = QueryRequest::by_filter(filter.clone(), 10);
        assert!(request.vector.is_none());
        assert_eq!(request.filter, Some(filter));
    }
}
