//! Capability traits and their shared value types.

use agro_core::AppResult;
use serde::{Deserialize, Serialize};

/// Best answer span an extractive reader found in one passage.
///
/// An empty `answer` means the reader judged the passage unanswerable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub score: f32,
}

impl QaAnswer {
    pub fn none() -> Self {
        Self {
            answer: String::new(),
            score: 0.0,
        }
    }

    pub fn has_span(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// Scores how relevant each passage is to a question.
#[async_trait::async_trait]
pub trait Reranker: Send + Sync {
    /// Get the provider name (e.g., "http", "lexical").
    fn provider_name(&self) -> &str;

    /// Score every passage against `query`.
    ///
    /// The returned vector is in input order and has one score per passage.
    /// Higher is more relevant; the scale is provider-specific.
    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>>;
}

/// Extracts an answer span for a question from a single passage.
#[async_trait::async_trait]
pub trait ExtractiveReader: Send + Sync {
    /// Get the provider name (e.g., "http", "lexical").
    fn provider_name(&self) -> &str;

    /// Return the best span of `context` answering `question`.
    ///
    /// `max_answer_len` bounds the span length in tokens. "No answer" is a
    /// valid outcome and is reported as an empty span, not an error.
    async fn answer(&self, question: &str, context: &str, max_answer_len: usize)
        -> AppResult<QaAnswer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_answer_has_no_span() {
        let answer = QaAnswer {
            answer: "  ".to_string(),
            score: 0.9,
        };
        assert!(!answer.has_span());
        assert!(!QaAnswer::none().has_span());
    }
}
