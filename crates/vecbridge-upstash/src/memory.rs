use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vecbridge_core::Result;

use crate::index::{IndexRecord, QueryRequest, ScoredRecord, VectorIndex};

/// An in-process [`VectorIndex`] for tests and local development.
///
/// Namespaces map ids to records; ids iterate in sorted order, which makes
/// equal-score ties come back deterministically. Similarity is cosine,
/// rescaled to `[0, 1]` the way Upstash reports cosine scores.
#[derive(Default)]
pub struct InMemoryIndex {
    namespaces: RwLock<HashMap<String, BTreeMap<String, IndexRecord>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `namespace` (0 if it does not exist).
    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, BTreeMap::len)
    }

    /// Whether `namespace` currently exists.
    pub async fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().await.contains_key(namespace)
    }
}

/// Cosine similarity mapped from `[-1, 1]` to `[0, 1]`. Zero vectors score 0.5.
fn cosine_score(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let cosine = if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    };
    (1.0 + cosine) / 2.0
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, records: Vec<IndexRecord>, namespace: &str) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let entries = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entries.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn fetch(&self, ids: &[&str], namespace: &str) -> Result<Vec<Option<IndexRecord>>> {
        let namespaces = self.namespaces.read().await;
        let entries = namespaces.get(namespace);
        Ok(ids
            .iter()
            .map(|id| entries.and_then(|e| e.get(*id)).cloned())
            .collect())
    }

    async fn query(&self, request: QueryRequest, namespace: &str) -> Result<Vec<ScoredRecord>> {
        let namespaces = self.namespaces.read().await;
        let Some(entries) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<ScoredRecord> = entries
            .values()
            .filter(|record| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|f| f.matches(record.metadata.as_ref()))
            })
            .map(|record| {
                let score = match (&request.vector, &record.vector) {
                    (Some(query), Some(stored)) => cosine_score(query, stored),
                    _ => 0.0,
                };
                ScoredRecord {
                    id: record.id.clone(),
                    score,
                    vector: record.vector.clone().filter(|_| request.include_vectors),
                    metadata: record.metadata.clone().filter(|_| request.include_metadata),
                    data: record.data.clone().filter(|_| request.include_data),
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(request.top_k);
        Ok(hits)
    }

    async fn delete(&self, ids: &[&str], namespace: &str) -> Result<usize> {
        let mut namespaces = self.namespaces.write().await;
        let Some(entries) = namespaces.get_mut(namespace) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| entries.remove(**id).is_some()).count())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.namespaces.write().await.remove(namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_score_range() {
        assert!((cosine_score(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_score(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_score(&[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
        assert!((cosine_score(&[0.0, 0.0], &[1.0, 1.0]) - 0.5).abs() < 1e-6);
    }
}
