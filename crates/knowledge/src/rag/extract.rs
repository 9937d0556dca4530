//! Per-candidate evidence extraction.
//!
//! Each candidate gets one reader call and one numeric scan. Reader calls
//! fan out over a bounded number of workers; the result order is fixed by an
//! explicit sort afterwards, never by completion order.

use crate::rag::numeric;
use crate::rag::types::{ExtractedAnswer, RetrievedCandidate};
use agro_models::{ExtractiveReader, QaAnswer};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::time::Duration;

/// Extraction knobs taken from the corpus config.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_answer_len: usize,
    pub min_answer_score: f32,
    pub workers: usize,
    pub timeout: Duration,
}

/// Ask the reader about every candidate and keep the ones with evidence.
///
/// A candidate is kept when the reader returned a non-empty span scoring
/// above `min_answer_score`, or when its text holds any numeric evidence.
/// Reader failures and timeouts count as "no answer". Kept answers are
/// ordered by span presence, then confidence, then rerank score.
pub async fn extract(
    reader: Option<&dyn ExtractiveReader>,
    query: &str,
    candidates: &[RetrievedCandidate],
    options: ExtractOptions,
) -> Vec<ExtractedAnswer> {
    let mut results: Vec<(usize, Option<ExtractedAnswer>)> =
        stream::iter(candidates.iter().enumerate())
            .map(|(position, candidate)| async move {
                let qa = ask_reader(reader, query, candidate, options).await;
                (position, accept(candidate, qa, options.min_answer_score))
            })
            .buffer_unordered(options.workers.max(1))
            .collect()
            .await;

    results.sort_by_key(|(position, _)| *position);
    let mut answers: Vec<ExtractedAnswer> = results.into_iter().filter_map(|(_, a)| a).collect();
    answers.sort_by(rank_order);

    tracing::debug!(
        "Extracted {} of {} candidates ({} with spans)",
        answers.len(),
        candidates.len(),
        answers.iter().filter(|a| a.has_span()).count()
    );

    answers
}

async fn ask_reader(
    reader: Option<&dyn ExtractiveReader>,
    query: &str,
    candidate: &RetrievedCandidate,
    options: ExtractOptions,
) -> QaAnswer {
    let Some(reader) = reader else {
        return QaAnswer::none();
    };

    let call = reader.answer(query, &candidate.chunk.text, options.max_answer_len);
    match tokio::time::timeout(options.timeout, call).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            tracing::warn!(
                "Reader '{}' failed on {}: {}",
                reader.provider_name(),
                candidate.chunk.id,
                e
            );
            QaAnswer::none()
        }
        Err(_) => {
            tracing::warn!(
                "Reader '{}' timed out on {} after {:?}",
                reader.provider_name(),
                candidate.chunk.id,
                options.timeout
            );
            QaAnswer::none()
        }
    }
}

fn accept(
    candidate: &RetrievedCandidate,
    qa: QaAnswer,
    min_answer_score: f32,
) -> Option<ExtractedAnswer> {
    let span = qa.answer.trim().to_string();
    let numbers = numeric::scan(&candidate.chunk.text);
    let confident = !span.is_empty() && qa.score > min_answer_score;

    if !confident && numbers.is_empty() {
        return None;
    }

    Some(ExtractedAnswer {
        answer_span: span,
        confidence: qa.score,
        source_chunk: candidate.chunk.clone(),
        numbers,
        rerank_score: candidate.relevance_score,
    })
}

/// Descending by (has span, confidence, rerank score).
fn rank_order(a: &ExtractedAnswer, b: &ExtractedAnswer) -> Ordering {
    b.has_span()
        .cmp(&a.has_span())
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| b.rerank_score.total_cmp(&a.rerank_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use agro_core::{AppError, AppResult};

    /// Answers with the first word of the passage, scored by passage length.
    struct FirstWord;

    #[async_trait::async_trait]
    impl ExtractiveReader for FirstWord {
        fn provider_name(&self) -> &str {
            "first-word"
        }

        async fn answer(&self, _q: &str, context: &str, _max: usize) -> AppResult<QaAnswer> {
            if context.starts_with("fail") {
                return Err(AppError::Capability("reader down".to_string()));
            }
            if context.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if context.starts_with("none") {
                return Ok(QaAnswer::none());
            }
            Ok(QaAnswer {
                answer: context.split(' ').next().unwrap_or_default().to_string(),
                score: context.len() as f32 / 100.0,
            })
        }
    }

    fn candidate(seq: usize, text: &str, score: f32) -> RetrievedCandidate {
        RetrievedCandidate {
            chunk: Chunk::new("doc.txt", seq, text.to_string()),
            relevance_score: score,
        }
    }

    fn options() -> ExtractOptions {
        ExtractOptions {
            max_answer_len: 120,
            min_answer_score: 0.05,
            workers: 4,
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_ranked_by_span_then_confidence() {
        let candidates = vec![
            candidate(0, "none here but 12% of area.", 9.0),
            candidate(1, "Short answer text.", 1.0),
            candidate(2, "Longer answer text with more words inside.", 0.5),
        ];

        let answers = extract(Some(&FirstWord), "q", &candidates, options()).await;

        let ids: Vec<&str> = answers.iter().map(|a| a.source_chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["doc.txt__2", "doc.txt__1", "doc.txt__0"]);
        assert!(!answers[2].has_span());
        assert_eq!(answers[2].numbers[0].raw, "12%");
    }

    #[tokio::test]
    async fn test_low_confidence_without_numbers_dropped() {
        let candidates = vec![candidate(0, "Tiny.", 1.0)];
        assert!(extract(Some(&FirstWord), "q", &candidates, options()).await.is_empty());
    }

    #[tokio::test]
    async fn test_reader_failure_keeps_numbers() {
        let candidates = vec![
            candidate(0, "fail but wheat yield rose 15%.", 1.0),
            candidate(1, "fail with nothing numeric.", 1.0),
        ];

        let answers = extract(Some(&FirstWord), "q", &candidates, options()).await;

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_span, "");
        assert_eq!(answers[0].numbers[0].raw, "15%");
    }

    #[tokio::test]
    async fn test_reader_timeout_is_no_answer() {
        let candidates = vec![candidate(0, "slow passage about 1000 mm rainfall.", 1.0)];

        let answers = extract(Some(&FirstWord), "q", &candidates, options()).await;

        assert_eq!(answers.len(), 1);
        assert!(!answers[0].has_span());
    }

    #[tokio::test]
    async fn test_without_reader_only_numbers_count() {
        let candidates = vec![
            candidate(0, "Barley gives 20 q/ha.", 1.0),
            candidate(1, "Barley grows well.", 2.0),
        ];

        let answers = extract(None, "q", &candidates, options()).await;

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].source_chunk.id, "doc.txt__0");
    }
}
