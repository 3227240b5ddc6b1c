use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use vecbridge_core::{
    Document, Result, SearchOptions, VecbridgeError, VectorStore, VectorType, DOC_ID_KEY,
    SCORE_KEY,
};

use crate::config::UpstashVectorConfig;
use crate::http::HttpIndex;
use crate::index::{
    IndexRecord, MetadataFilter, QueryRequest, VectorIndex, MAX_FILTER_QUERY_TOP_K,
};

// ---------------------------------------------------------------------------
// UpstashVector
// ---------------------------------------------------------------------------

/// A [`VectorStore`] backed by [Upstash Vector](https://upstash.com/docs/vector).
///
/// Each collection is an Upstash namespace. Every document is stored as one
/// record with:
/// - **id**: the document's `doc_id` metadata value
/// - **vector**: the embedding
/// - **metadata**: the full document metadata
/// - **data**: the page content
///
/// Upstash has no lexical search, so [`search_by_text`](VectorStore::search_by_text)
/// always comes back empty.
pub struct UpstashVector {
    collection_name: String,
    index: Arc<dyn VectorIndex>,
}

impl UpstashVector {
    /// Bind a REST-backed store to `collection_name`.
    pub fn new(collection_name: impl Into<String>, config: UpstashVectorConfig) -> Self {
        Self::with_index(collection_name, Arc::new(HttpIndex::new(&config)))
    }

    /// Bind a store to `collection_name` over any [`VectorIndex`].
    pub fn with_index(collection_name: impl Into<String>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            collection_name: collection_name.into(),
            index,
        }
    }

    fn to_records(
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Vec<IndexRecord>> {
        if documents.len() != embeddings.len() {
            return Err(VecbridgeError::InvalidArgument(format!(
                "got {} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        documents
            .into_iter()
            .zip(embeddings)
            .map(|(doc, vector)| -> Result<IndexRecord> {
                let id = doc
                    .doc_id()
                    .ok_or_else(|| {
                        VecbridgeError::InvalidArgument(format!(
                            "document is missing a string `{DOC_ID_KEY}` metadata value"
                        ))
                    })?
                    .to_string();
                Ok(IndexRecord {
                    id,
                    vector: Some(vector),
                    metadata: Some(doc.metadata),
                    data: Some(doc.page_content),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// VectorStore implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl VectorStore for UpstashVector {
    fn vector_type(&self) -> VectorType {
        VectorType::Upstash
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn create(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        self.upsert(documents, embeddings).await
    }

    async fn upsert(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let records = Self::to_records(documents, embeddings)?;
        if records.is_empty() {
            return Ok(());
        }

        debug!(
            collection = %self.collection_name,
            count = records.len(),
            "upserting documents"
        );
        self.index.upsert(records, &self.collection_name).await
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let found = self.index.fetch(&[id], &self.collection_name).await?;
        Ok(found.iter().any(Option::is_some))
    }

    async fn delete_by_ids(&self, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let deleted = self.index.delete(ids, &self.collection_name).await?;
        debug!(
            collection = %self.collection_name,
            requested = ids.len(),
            deleted,
            "deleted documents by id"
        );
        Ok(())
    }

    async fn delete_by_metadata_field(&self, key: &str, value: &str) -> Result<()> {
        let filter = MetadataFilter::eq(key, value)?;

        // Query a page of matching ids, delete them, repeat until a short page.
        // Ids seen before are skipped so an index that lags behind its own
        // deletes cannot keep the loop alive.
        let mut seen = HashSet::new();
        loop {
            let request = QueryRequest::by_filter(filter.clone(), MAX_FILTER_QUERY_TOP_K);
            let hits = self.index.query(request, &self.collection_name).await?;
            let ids: Vec<&str> = hits
                .iter()
                .map(|hit| hit.id.as_str())
                .filter(|id| seen.insert(id.to_string()))
                .collect();
            if ids.is_empty() {
                break;
            }

            debug!(
                collection = %self.collection_name,
                key,
                count = ids.len(),
                "deleting documents by metadata field"
            );
            self.index.delete(&ids, &self.collection_name).await?;

            if hits.len() < MAX_FILTER_QUERY_TOP_K {
                break;
            }
        }
        Ok(())
    }

    async fn search_by_vector(
        &self,
        query: &[f32],
        options: SearchOptions,
    ) -> Result<Vec<Document>> {
        if options.top_k == 0 {
            return Ok(Vec::new());
        }

        let request = QueryRequest::by_vector(query.to_vec(), options.top_k)
            .with_metadata()
            .with_data();
        let hits = self.index.query(request, &self.collection_name).await?;

        let mut scored: Vec<(f32, Document)> = hits
            .into_iter()
            .filter(|hit| hit.score >= options.score_threshold)
            .map(|hit| {
                let mut metadata = hit.metadata.unwrap_or_default();
                metadata.insert(SCORE_KEY.to_string(), Value::from(f64::from(hit.score)));
                (
                    hit.score,
                    Document::with_metadata(hit.data.unwrap_or_default(), metadata),
                )
            })
            .collect();

        // Stable: equal scores keep the backend's order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(options.top_k);
        Ok(scored.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn search_by_text(&self, _query: &str, _options: SearchOptions) -> Result<Vec<Document>> {
        Ok(Vec::new())
    }

    async fn delete_collection(&self) -> Result<()> {
        debug!(collection = %self.collection_name, "deleting collection");
        self.index.delete_namespace(&self.collection_name).await
    }
}
