//! HTTP model-server providers.
//!
//! Both capabilities talk JSON to a model server:
//! - `POST {endpoint}/rerank` with `{query, texts}` answers `[{index, score}]`
//!   (cross-encoder servers such as text-embeddings-inference)
//! - `POST {endpoint}/qa` with `{question, context, max_answer_len,
//!   handle_impossible_answer}` answers `{answer, score}`
//!
//! Transient failures are retried with exponential backoff.

use crate::client::{ExtractiveReader, QaAnswer, Reranker};
use agro_core::{AppError, AppResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const RERANK_ENDPOINT: &str = "/rerank";
const QA_ENDPOINT: &str = "/qa";

/// Maximum attempts per request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout when the config does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    question: &'a str,
    context: &'a str,
    max_answer_len: usize,
    handle_impossible_answer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QaResponse {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    score: f32,
}

/// Shared HTTP plumbing for both capability clients.
#[derive(Debug, Clone)]
struct ModelServer {
    client: Client,
    base_url: String,
    model: Option<String>,
}

impl ModelServer {
    fn new(endpoint: &str, model: Option<String>, timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Capability(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            model,
        })
    }

    async fn post_with_retries<Req, Resp>(&self, path: &str, body: &Req) -> AppResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < MAX_RETRIES {
            match self.post_once(path, body).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Model server call {} failed (attempt {}/{}), retrying in {}ms",
                            path, attempt, MAX_RETRIES, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Capability(format!("Unknown error calling {}", path))))
    }

    async fn post_once<Req, Resp>(&self, path: &str, body: &Req) -> AppResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Capability(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Capability(format!(
                "Model server error ({}) from {}: {}",
                status, url, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Capability(format!("Failed to parse response from {}: {}", url, e)))
    }
}

/// Cross-encoder reranker served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReranker {
    server: ModelServer,
}

impl HttpReranker {
    pub fn new(endpoint: &str, model: Option<String>, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            server: ModelServer::new(endpoint, model, timeout_secs)?,
        })
    }
}

#[async_trait::async_trait]
impl Reranker for HttpReranker {
    fn provider_name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, query, passages), fields(passages = passages.len(), endpoint = %self.server.base_url))]
    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            query,
            texts: passages,
            model: self.server.model.as_deref(),
        };
        let hits: Vec<RerankHit> = self.server.post_with_retries(RERANK_ENDPOINT, &request).await?;

        scores_in_input_order(hits, passages.len())
    }
}

/// Servers answer sorted by score; put scores back in passage order.
fn scores_in_input_order(hits: Vec<RerankHit>, expected: usize) -> AppResult<Vec<f32>> {
    let mut scores: Vec<Option<f32>> = vec![None; expected];

    for hit in hits {
        let slot = scores.get_mut(hit.index).ok_or_else(|| {
            AppError::Capability(format!(
                "Reranker returned index {} for {} passages",
                hit.index, expected
            ))
        })?;
        *slot = Some(hit.score);
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or_else(|| AppError::Capability(format!("Reranker returned no score for passage {}", i)))
        })
        .collect()
}

/// Extractive question-answering model served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReader {
    server: ModelServer,
}

impl HttpReader {
    pub fn new(endpoint: &str, model: Option<String>, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            server: ModelServer::new(endpoint, model, timeout_secs)?,
        })
    }
}

#[async_trait::async_trait]
impl ExtractiveReader for HttpReader {
    fn provider_name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, question, context), fields(context_len = context.len(), endpoint = %self.server.base_url))]
    async fn answer(
        &self,
        question: &str,
        context: &str,
        max_answer_len: usize,
    ) -> AppResult<QaAnswer> {
        let request = QaRequest {
            question,
            context,
            max_answer_len,
            handle_impossible_answer: true,
            model: self.server.model.as_deref(),
        };
        let response: QaResponse = self.server.post_with_retries(QA_ENDPOINT, &request).await?;

        Ok(QaAnswer {
            answer: response.answer.trim().to_string(),
            score: response.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(index: usize, score: f32) -> RerankHit {
        RerankHit { index, score }
    }

    #[test]
    fn test_scores_restored_to_input_order() {
        let scores = scores_in_input_order(vec![hit(2, 0.9), hit(0, 0.5), hit(1, 0.1)], 3).unwrap();
        assert_eq!(scores, vec![0.5, 0.1, 0.9]);
    }

    #[test]
    fn test_missing_score_is_error() {
        let result = scores_in_input_order(vec![hit(0, 0.5)], 2);
        assert!(matches!(result, Err(AppError::Capability(_))));
    }

    #[test]
    fn test_out_of_range_index_is_error() {
        let result = scores_in_input_order(vec![hit(0, 0.5), hit(5, 0.2)], 1);
        assert!(matches!(result, Err(AppError::Capability(_))));
    }

    #[test]
    fn test_qa_request_shape() {
        let request = QaRequest {
            question: "q",
            context: "c",
            max_answer_len: 120,
            handle_impossible_answer: true,
            model: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_answer_len"], 120);
        assert_eq!(json["handle_impossible_answer"], true);
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let reader = HttpReader::new("http://localhost:9000/", None, 5).unwrap();
        assert_eq!(reader.server.base_url, "http://localhost:9000");
    }
}
