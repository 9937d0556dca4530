//! Corpus type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-corpus settings, stored at `.agro/corpus/<name>/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusConfig {
    /// Name of the corpus
    pub name: String,

    /// Region anchor appended to expanded queries
    #[serde(default = "default_region")]
    pub region: String,

    /// Unit of the chunk size budget
    #[serde(default)]
    pub tokenizer: Tokenizer,

    /// Chunk budget in tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Smallest chunk worth emitting, in tokens
    #[serde(default = "default_min_chunk")]
    pub min_chunk: usize,

    /// Embedding provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Texts per embedding request during index builds
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,

    /// Candidates fetched from the index per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates kept after reranking
    #[serde(default = "default_rerank_top")]
    pub rerank_top: usize,

    /// Longest answer span requested from the reader, in tokens
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,

    /// Reader confidence a span must exceed to count
    #[serde(default = "default_min_answer_score")]
    pub min_answer_score: f32,

    /// Concurrent reader calls per query
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Deadline for each rerank or reader call
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: u64,

    /// Longest snippet shown per cited source, in characters
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

/// How chunk budgets are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    /// GPT-2 byte-pair tokens
    #[default]
    Gpt2,
    /// Whitespace-separated words
    Words,
}

fn default_region() -> String {
    "Uttarakhand".to_string()
}

fn default_chunk_size() -> usize {
    400
}

fn default_min_chunk() -> usize {
    80
}

fn default_provider() -> String {
    "trigram".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_embedding_dim() -> usize {
    384
}

fn default_embed_batch_size() -> usize {
    64
}

fn default_top_k() -> usize {
    20
}

fn default_rerank_top() -> usize {
    6
}

fn default_max_answer_len() -> usize {
    120
}

fn default_min_answer_score() -> f32 {
    0.05
}

fn default_workers() -> usize {
    4
}

fn default_capability_timeout_secs() -> u64 {
    30
}

fn default_snippet_chars() -> usize {
    200
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            region: default_region(),
            tokenizer: Tokenizer::default(),
            chunk_size: default_chunk_size(),
            min_chunk: default_min_chunk(),
            provider: default_provider(),
            model: default_model(),
            embedding_dim: default_embedding_dim(),
            embed_batch_size: default_embed_batch_size(),
            top_k: default_top_k(),
            rerank_top: default_rerank_top(),
            max_answer_len: default_max_answer_len(),
            min_answer_score: default_min_answer_score(),
            workers: default_workers(),
            capability_timeout_secs: default_capability_timeout_secs(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

/// A source document after text extraction and whitespace normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// File name, used as the citation source
    pub name: String,

    /// Normalized text
    pub text: String,
}

/// A retrieval unit cut from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<source>__<seq>`
    pub id: String,

    pub text: String,

    /// Originating document name
    pub source: String,
}

impl Chunk {
    pub fn new(source: &str, seq: usize, text: String) -> Self {
        Self {
            id: format!("{}__{}", source, seq),
            text,
            source: source.to_string(),
        }
    }
}

/// Statistics from chunking a document set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStats {
    pub documents: usize,
    pub chunks: usize,
    pub bytes_processed: u64,
    pub duration_secs: f64,
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub entries: usize,
    pub dimensions: usize,
    pub provider: String,
    pub model: String,
    pub duration_secs: f64,
}

/// Current state of a corpus on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub corpus: String,

    /// Distinct sources among chunk records
    pub documents: usize,

    pub chunks: usize,

    /// Entries in the live index, if one exists
    pub index_entries: Option<usize>,

    pub records_size_bytes: u64,

    pub index_size_bytes: u64,

    pub built_at: Option<DateTime<Utc>>,
}
