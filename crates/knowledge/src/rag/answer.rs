//! Query entry point.
//!
//! classify → expand → retrieve + rerank → extract → synthesize.
//! Capabilities are injected at construction; nothing here holds global
//! model state. Answering never fails: every capability error degrades to
//! a documented fallback and the caller always gets a response.

use crate::rag::classify::{classify, IntentFlags};
use crate::rag::expand::expand;
use crate::rag::extract::{extract, ExtractOptions};
use crate::rag::retrieve::{retrieve, RetrieveOptions};
use crate::rag::synthesize::{route, synthesize};
use crate::rag::types::{CitedSource, ExtractedAnswer, RetrievedCandidate, SynthesizedAnswer};
use crate::types::CorpusConfig;
use crate::vector_index::ChunkSearch;
use agro_models::{ExtractiveReader, Reranker};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found.";

/// Most sources cited in one answer.
const MAX_CITED_SOURCES: usize = 6;

/// Every intermediate result of one query, for `--explain` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTrace {
    pub flags: IntentFlags,
    pub expanded_query: String,
    pub candidates: Vec<RetrievedCandidate>,
    pub extracted: Vec<ExtractedAnswer>,

    /// Synthesis rule that rendered the answer, if any evidence was found
    pub rule: Option<&'static str>,

    pub answer: SynthesizedAnswer,
}

/// Answers questions over one indexed corpus.
pub struct AnswerPipeline {
    search: Arc<dyn ChunkSearch>,
    reranker: Option<Arc<dyn Reranker>>,
    reader: Option<Arc<dyn ExtractiveReader>>,
    config: CorpusConfig,
}

impl AnswerPipeline {
    /// A pipeline without reranker or reader; add them with the builders.
    pub fn new(search: Arc<dyn ChunkSearch>, config: CorpusConfig) -> Self {
        Self {
            search,
            reranker: None,
            reader: None,
            config,
        }
    }

    pub fn with_reranker(mut self, reranker: Option<Arc<dyn Reranker>>) -> Self {
        self.reranker = reranker;
        self
    }

    pub fn with_reader(mut self, reader: Option<Arc<dyn ExtractiveReader>>) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Answer `query` with cited sources.
    pub async fn generate_answer(&self, query: &str) -> SynthesizedAnswer {
        self.explain(query).await.answer
    }

    /// Answer `query` and keep every intermediate result.
    #[instrument(skip(self), fields(corpus = %self.config.name))]
    pub async fn explain(&self, query: &str) -> AnswerTrace {
        let timeout = Duration::from_secs(self.config.capability_timeout_secs);

        let flags = classify(query);
        let expanded_query = expand(query, &flags, &self.config.region);
        tracing::debug!("Intent flags: {:?}; expanded query: {}", flags.active(), expanded_query);

        let candidates = retrieve(
            self.search.as_ref(),
            self.reranker.as_deref(),
            query,
            &expanded_query,
            RetrieveOptions {
                top_k: self.config.top_k,
                rerank_top: self.config.rerank_top,
                timeout,
            },
        )
        .await;

        if candidates.is_empty() {
            tracing::info!("No candidates retrieved");
            return AnswerTrace {
                flags,
                expanded_query,
                candidates,
                extracted: Vec::new(),
                rule: None,
                answer: SynthesizedAnswer {
                    query: query.to_string(),
                    answer: NO_RELEVANT_DOCUMENTS.to_string(),
                    sources: Vec::new(),
                },
            };
        }

        let extracted = extract(
            self.reader.as_deref(),
            query,
            &candidates,
            ExtractOptions {
                max_answer_len: self.config.max_answer_len,
                min_answer_score: self.config.min_answer_score,
                workers: self.config.workers,
                timeout,
            },
        )
        .await;

        let rule = route(&flags, &extracted).map(|r| r.name);
        let answer = SynthesizedAnswer {
            query: query.to_string(),
            answer: synthesize(query, &flags, &extracted),
            sources: cite(&extracted, self.config.snippet_chars),
        };

        tracing::info!(
            "Answered from {} candidates, {} with evidence (rule: {})",
            candidates.len(),
            extracted.len(),
            rule.unwrap_or("none")
        );

        AnswerTrace {
            flags,
            expanded_query,
            candidates,
            extracted,
            rule,
            answer,
        }
    }
}

fn cite(extracted: &[ExtractedAnswer], snippet_chars: usize) -> Vec<CitedSource> {
    extracted
        .iter()
        .take(MAX_CITED_SOURCES)
        .map(|a| CitedSource {
            source: a.source().to_string(),
            has_span: a.has_span(),
            snippet: truncate_snippet(
                if a.has_span() { &a.answer_span } else { a.context() },
                snippet_chars,
            ),
        })
        .collect()
}

/// First `max_chars` characters of `text`, trimmed.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}
