//! Local term-overlap providers.
//!
//! No model download, deterministic output. Useful offline and as the
//! default when no model server is configured.

use crate::client::{ExtractiveReader, QaAnswer, Reranker};
use agro_core::AppResult;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "which", "who", "how", "with", "from",
    "that", "this", "these", "those", "can", "could", "should", "would", "into", "over", "has",
    "have", "had", "does", "did", "its", "their", "there", "than", "then", "also", "about", "any",
];

/// Lowercased content words of length three or more.
fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Share of query terms present in the passage, in `[0, 1]`.
fn overlap(query_terms: &HashSet<String>, passage: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let passage_terms = terms(passage);
    let hits = query_terms.iter().filter(|t| passage_terms.contains(*t)).count();
    hits as f32 / query_terms.len() as f32
}

/// Scores passages by the fraction of query terms they contain.
#[derive(Debug, Clone, Default)]
pub struct TermOverlapReranker;

impl TermOverlapReranker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Reranker for TermOverlapReranker {
    fn provider_name(&self) -> &str {
        "lexical"
    }

    async fn score(&self, query: &str, passages: &[String]) -> AppResult<Vec<f32>> {
        let query_terms = terms(query);
        Ok(passages.iter().map(|p| overlap(&query_terms, p)).collect())
    }
}

/// Answers with the passage sentence sharing the most terms with the question.
#[derive(Debug, Clone, Default)]
pub struct LexicalReader;

impl LexicalReader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ExtractiveReader for LexicalReader {
    fn provider_name(&self) -> &str {
        "lexical"
    }

    async fn answer(
        &self,
        question: &str,
        context: &str,
        max_answer_len: usize,
    ) -> AppResult<QaAnswer> {
        let question_terms = terms(question);

        let mut best: Option<(&str, f32)> = None;
        for sentence in context.unicode_sentences() {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            let score = overlap(&question_terms, sentence);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((sentence, score));
            }
        }

        match best {
            Some((sentence, score)) if score > 0.0 => Ok(QaAnswer {
                answer: clip_words(sentence, max_answer_len),
                score,
            }),
            _ => Ok(QaAnswer::none()),
        }
    }
}

fn clip_words(sentence: &str, max_words: usize) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() <= max_words {
        sentence.to_string()
    } else {
        words[..max_words].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reranker_prefers_overlapping_passage() {
        let reranker = TermOverlapReranker::new();
        let passages = vec![
            "Apple orchards need winter chill.".to_string(),
            "Rainfed wheat and mustard are common rabi crops.".to_string(),
        ];

        let scores = reranker
            .score("Which rabi crops suit rainfed land?", &passages)
            .await
            .unwrap();

        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }

    #[tokio::test]
    async fn test_reranker_empty_query_scores_zero() {
        let reranker = TermOverlapReranker::new();
        let scores = reranker.score("the and", &["anything at all".to_string()]).await.unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[tokio::test]
    async fn test_reader_picks_best_sentence() {
        let reader = LexicalReader::new();
        let context = "Hill farming is hard. Improved wheat seed increased yield by 15% in trials. Markets are far.";

        let answer = reader
            .answer("How much did improved seed increase wheat yield?", context, 120)
            .await
            .unwrap();

        assert_eq!(answer.answer, "Improved wheat seed increased yield by 15% in trials.");
        assert!(answer.score > 0.5);
    }

    #[tokio::test]
    async fn test_reader_no_overlap_is_no_answer() {
        let reader = LexicalReader::new();
        let answer = reader
            .answer("drone spraying roles", "Apples need chill hours.", 120)
            .await
            .unwrap();
        assert!(!answer.has_span());
        assert_eq!(answer.score, 0.0);
    }

    #[tokio::test]
    async fn test_reader_clips_long_span() {
        let reader = LexicalReader::new();
        let answer = reader
            .answer("wheat yield", "wheat yield was high this year in most districts", 3)
            .await
            .unwrap();
        assert_eq!(answer.answer, "wheat yield was");
    }
}
