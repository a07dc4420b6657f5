use std::future::Future;
use std::time::Duration;

use serde_json::json;

use crate::store::{GraphError, KnowledgeGraph, NewTopic, TopicNode};

const MAX_ATTEMPTS: u32 = 3;

/// Capped exponential backoff: 1s, 2s, 4s, then 5s flat.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(31);
    let millis = 1000u64.saturating_mul(1u64 << exp).min(5000);
    Duration::from_millis(millis)
}

/// Client for the remote graph backend. Retries transient failures with
/// capped backoff; validation and not-found responses surface immediately.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, GraphError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GraphError::Network(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        })
    }

    pub async fn fetch_graph(&self) -> Result<KnowledgeGraph, GraphError> {
        let url = format!("{}/api/graph", self.base_url);
        self.with_retry(|| async {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let response = self.check_status(response)?;
            response
                .json::<KnowledgeGraph>()
                .await
                .map_err(|e| GraphError::Fetch(format!("decode graph: {e}")))
        })
        .await
    }

    pub async fn update_confidence(
        &self,
        node_id: &str,
        value: f64,
    ) -> Result<TopicNode, GraphError> {
        let url = format!("{}/api/graph/topics/{node_id}/confidence", self.base_url);
        let body = json!({ "confidence": value });
        self.with_retry(|| async {
            let response = self
                .http
                .patch(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let response = self.check_status(response)?;
            response
                .json::<TopicNode>()
                .await
                .map_err(|e| GraphError::Fetch(format!("decode topic: {e}")))
        })
        .await
    }

    pub async fn create_topic(&self, new: &NewTopic) -> Result<TopicNode, GraphError> {
        let url = format!("{}/api/graph/topics", self.base_url);
        let body = json!({
            "id": new.id,
            "label": new.label,
            "confidence": new.confidence,
            "notes": new.notes,
            "resources": new.resources,
        });
        self.with_retry(|| async {
            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let response = self.check_status(response)?;
            response
                .json::<TopicNode>()
                .await
                .map_err(|e| GraphError::Fetch(format!("decode topic: {e}")))
        })
        .await
    }

    pub async fn delete_topic(&self, node_id: &str) -> Result<(), GraphError> {
        let url = format!("{}/api/graph/topics/{node_id}", self.base_url);
        self.with_retry(|| async {
            let response = self
                .http
                .delete(&url)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            self.check_status(response).map(|_| ())
        })
        .await
    }

    /// Runs `op` up to MAX_ATTEMPTS times. Only transient failure classes are
    /// retried; everything else propagates on first sight.
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, GraphError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GraphError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient graph backend failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GraphError {
        if err.is_timeout() {
            GraphError::Timeout(self.timeout_ms)
        } else if err.is_connect() {
            GraphError::Network(err.to_string())
        } else {
            GraphError::Fetch(err.to_string())
        }
    }

    fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, GraphError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = format!("graph backend returned {status}");
        match status.as_u16() {
            404 => Err(GraphError::NotFound(message)),
            400 | 422 => Err(GraphError::Validation(message)),
            _ => Err(GraphError::Fetch(message)),
        }
    }
}
