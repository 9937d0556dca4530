//! Candidate retrieval and reranking.

use crate::rag::types::RetrievedCandidate;
use crate::types::Chunk;
use crate::vector_index::ChunkSearch;
use agro_models::Reranker;
use std::time::Duration;

/// Retrieval knobs taken from the corpus config.
#[derive(Debug, Clone, Copy)]
pub struct RetrieveOptions {
    pub top_k: usize,
    pub rerank_top: usize,
    pub timeout: Duration,
}

/// Fetch candidates with the expanded query, then rerank against the
/// original one.
///
/// Search failures fall back to the unexpanded query once. Rerank failures,
/// timeouts and malformed scores fall back to index order with a uniform
/// score of 1.0.
pub async fn retrieve(
    search: &dyn ChunkSearch,
    reranker: Option<&dyn Reranker>,
    query: &str,
    expanded: &str,
    options: RetrieveOptions,
) -> Vec<RetrievedCandidate> {
    let candidates = match search.search(expanded, options.top_k).await {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!("Expanded query search failed ({}), retrying with original query", e);
            match search.search(query, options.top_k).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!("Search failed: {}", e);
                    Vec::new()
                }
            }
        }
    };

    if candidates.is_empty() {
        return Vec::new();
    }

    let Some(reranker) = reranker else {
        return unranked(candidates, options.rerank_top);
    };

    let passages: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let scores = match tokio::time::timeout(options.timeout, reranker.score(query, &passages)).await
    {
        Ok(Ok(scores)) if scores.len() == candidates.len() => scores,
        Ok(Ok(scores)) => {
            tracing::warn!(
                "Reranker '{}' returned {} scores for {} candidates",
                reranker.provider_name(),
                scores.len(),
                candidates.len()
            );
            return unranked(candidates, options.rerank_top);
        }
        Ok(Err(e)) => {
            tracing::warn!("Reranker '{}' failed: {}", reranker.provider_name(), e);
            return unranked(candidates, options.rerank_top);
        }
        Err(_) => {
            tracing::warn!(
                "Reranker '{}' timed out after {:?}",
                reranker.provider_name(),
                options.timeout
            );
            return unranked(candidates, options.rerank_top);
        }
    };

    let mut ranked: Vec<RetrievedCandidate> = candidates
        .into_iter()
        .zip(scores)
        .map(|(chunk, relevance_score)| RetrievedCandidate {
            chunk,
            relevance_score,
        })
        .collect();
    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    ranked.truncate(options.rerank_top);

    tracing::debug!(
        "Reranked to {} candidates (top score {:.3})",
        ranked.len(),
        ranked.first().map(|c| c.relevance_score).unwrap_or_default()
    );

    ranked
}

fn unranked(candidates: Vec<Chunk>, rerank_top: usize) -> Vec<RetrievedCandidate> {
    candidates
        .into_iter()
        .take(rerank_top)
        .map(|chunk| RetrievedCandidate {
            chunk,
            relevance_score: 1.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::{AppError, AppResult};
    use std::sync::Mutex;

    struct FixedSearch {
        chunks: Vec<Chunk>,
        fail_on: Option<String>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        fn new(n: usize) -> Self {
            Self {
                chunks: (0..n)
                    .map(|i| Chunk::new("doc.txt", i, format!("passage {}", i)))
                    .collect(),
                fail_on: None,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChunkSearch for FixedSearch {
        async fn search(&self, query_text: &str, k: usize) -> AppResult<Vec<Chunk>> {
            self.queries.lock().unwrap().push(query_text.to_string());
            if self.fail_on.as_deref() == Some(query_text) {
                return Err(AppError::Index("boom".to_string()));
            }
            Ok(self.chunks.iter().take(k).cloned().collect())
        }
    }

    /// Scores passages by their trailing number.
    struct ByNumber {
        short: bool,
    }

    #[async_trait::async_trait]
    impl Reranker for ByNumber {
        fn provider_name(&self) -> &str {
            "by-number"
        }

        async fn score(&self, _query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
            let mut scores: Vec<f32> = passages
                .iter()
                .map(|p| {
                    p.rsplit(' ')
                        .next()
                        .and_then(|n| n.parse().ok())
                        .unwrap_or(0.0)
                })
                .collect();
            if self.short {
                scores.pop();
            }
            Ok(scores)
        }
    }

    fn options() -> RetrieveOptions {
        RetrieveOptions {
            top_k: 20,
            rerank_top: 3,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_rerank_sorts_and_truncates() {
        let search = FixedSearch::new(8);
        let reranker = ByNumber { short: false };

        let ranked = retrieve(&search, Some(&reranker), "q", "q expanded", options()).await;

        let ids: Vec<&str> = ranked.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["doc.txt__7", "doc.txt__6", "doc.txt__5"]);
        assert_eq!(ranked[0].relevance_score, 7.0);
        assert_eq!(*search.queries.lock().unwrap(), vec!["q expanded".to_string()]);
    }

    #[tokio::test]
    async fn test_no_reranker_keeps_index_order() {
        let search = FixedSearch::new(8);

        let ranked = retrieve(&search, None, "q", "q expanded", options()).await;

        let ids: Vec<&str> = ranked.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["doc.txt__0", "doc.txt__1", "doc.txt__2"]);
        assert!(ranked.iter().all(|c| c.relevance_score == 1.0));
    }

    #[tokio::test]
    async fn test_score_count_mismatch_falls_back() {
        let search = FixedSearch::new(5);
        let reranker = ByNumber { short: true };

        let ranked = retrieve(&search, Some(&reranker), "q", "q expanded", options()).await;

        assert_eq!(ranked[0].chunk.id, "doc.txt__0");
        assert_eq!(ranked[0].relevance_score, 1.0);
    }

    #[tokio::test]
    async fn test_failed_expanded_search_retries_original() {
        let mut search = FixedSearch::new(2);
        search.fail_on = Some("q expanded".to_string());

        let ranked = retrieve(&search, None, "q", "q expanded", options()).await;

        assert_eq!(ranked.len(), 2);
        assert_eq!(
            *search.queries.lock().unwrap(),
            vec!["q expanded".to_string(), "q".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_index_yields_nothing() {
        let search = FixedSearch::new(0);
        let reranker = ByNumber { short: false };

        assert!(retrieve(&search, Some(&reranker), "q", "q x", options()).await.is_empty());
    }
}
