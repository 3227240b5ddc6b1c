use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use vecbridge_core::{Result, VecbridgeError};

use crate::config::UpstashVectorConfig;
use crate::index::{IndexRecord, QueryRequest, ScoredRecord, VectorIndex};

// ---------------------------------------------------------------------------
// HttpIndex
// ---------------------------------------------------------------------------

/// A [`VectorIndex`] speaking the Upstash Vector REST API.
///
/// Every call is a single request authenticated with the config's bearer
/// token. Payloads come back wrapped as `{"result": ...}` and failures as
/// `{"error": "..."}`.
///
/// `/query` always needs a vector, so a filter-only [`QueryRequest`] first
/// looks up the index dimension and sends a placeholder vector of that size.
pub struct HttpIndex {
    url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpIndex {
    pub fn new(config: &UpstashVectorConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use a preconfigured client (proxies, timeouts, custom TLS).
    pub fn with_client(config: &UpstashVectorConfig, client: reqwest::Client) -> Self {
        Self {
            url: config.url().to_string(),
            token: config.token().to_string(),
            client,
        }
    }

    /// Build the URL for `action`, appending the namespace when it is not the
    /// default one.
    fn endpoint(&self, action: &str, namespace: &str) -> String {
        let base = self.url.trim_end_matches('/');
        if namespace.is_empty() {
            format!("{base}/{action}")
        } else {
            format!("{base}/{action}/{}", urlencoding::encode(namespace))
        }
    }

    /// Dimension of the index's vectors, from `GET /info`.
    pub async fn dimension(&self) -> Result<usize> {
        let result = self
            .send(Method::GET, self.endpoint("info", ""), None)
            .await?;
        let info: IndexInfo = decode(result, "info")?;
        Ok(info.dimension)
    }

    /// Send one request and unwrap the `result` field of a success response.
    async fn send(&self, method: Method, url: String, body: Option<Value>) -> Result<Value> {
        debug!(method = %method, url = %url, "upstash request");

        let mut request = self.client.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            VecbridgeError::BackendUnavailable(format!("Upstash request failed: {e}"))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            VecbridgeError::BackendUnavailable(format!("failed to read Upstash response: {e}"))
        })?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(status = status.as_u16(), url = %url, error = %message, "upstash API error");
            return Err(VecbridgeError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        parse_result(&text)
    }
}

/// Pull the `error` field out of a failure body, falling back to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| text.to_string())
}

fn parse_result(text: &str) -> Result<Value> {
    let mut value: Value = serde_json::from_str(text).map_err(|e| {
        VecbridgeError::Parsing(format!("failed to parse Upstash response: {e}"))
    })?;
    Ok(value
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| VecbridgeError::Parsing(format!("unexpected Upstash {what} result: {e}")))
}

fn query_body(request: &QueryRequest) -> Value {
    let mut body = json!({
        "topK": request.top_k,
        "includeVectors": request.include_vectors,
        "includeMetadata": request.include_metadata,
        "includeData": request.include_data,
    });
    if let Some(ref vector) = request.vector {
        body["vector"] = json!(vector);
    }
    if let Some(ref filter) = request.filter {
        body["filter"] = Value::String(filter.to_upstash());
    }
    body
}

/// Stand-in query vector for filter-only queries. Any non-zero vector works
/// because the hits are used unranked.
fn placeholder_vector(dimension: usize) -> Vec<f32> {
    vec![1.0; dimension]
}

#[derive(Deserialize)]
struct IndexInfo {
    dimension: usize,
}

#[derive(Deserialize)]
struct DeleteResult {
    #[serde(default)]
    deleted: usize,
}

// ---------------------------------------------------------------------------
// VectorIndex implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl VectorIndex for HttpIndex {
    async fn upsert(&self, records: Vec<IndexRecord>, namespace: &str) -> Result<()> {
        let body = serde_json::to_value(&records)
            .map_err(|e| VecbridgeError::Parsing(format!("failed to encode records: {e}")))?;
        self.send(Method::POST, self.endpoint("upsert", namespace), Some(body))
            .await?;
        Ok(())
    }

    async fn fetch(&self, ids: &[&str], namespace: &str) -> Result<Vec<Option<IndexRecord>>> {
        let body = json!({
            "ids": ids,
            "includeMetadata": true,
            "includeData": true,
        });
        let result = self
            .send(Method::POST, self.endpoint("fetch", namespace), Some(body))
            .await?;
        decode(result, "fetch")
    }

    async fn query(
        &self,
        mut request: QueryRequest,
        namespace: &str,
    ) -> Result<Vec<ScoredRecord>> {
        if request.vector.is_none() {
            let dimension = self.dimension().await?;
            request.vector = Some(placeholder_vector(dimension));
        }
        let result = self
            .send(
                Method::POST,
                self.endpoint("query", namespace),
                Some(query_body(&request)),
            )
            .await?;
        decode(result, "query")
    }

    async fn delete(&self, ids: &[&str], namespace: &str) -> Result<usize> {
        let body = json!({ "ids": ids });
        let result = self
            .send(Method::DELETE, self.endpoint("delete", namespace), Some(body))
            .await?;
        let result: DeleteResult = decode(result, "delete")?;
        Ok(result.deleted)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        match self
            .send(
                Method::DELETE,
                self.endpoint("delete-namespace", namespace),
                None,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(VecbridgeError::Backend { status: 404, .. }) => {
                debug!(namespace, "upstash namespace already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
