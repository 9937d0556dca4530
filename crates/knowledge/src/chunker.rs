//! Sentence-aligned chunking under a token budget.
//!
//! Sentences are accumulated greedily. When the next sentence would push
//! the buffer past `chunk_size`, the buffer is emitted (if it reached
//! `min_chunk`) and its last two sentences seed the next buffer. The
//! carryover happens whether or not the buffer was emitted.

use crate::progress::ProgressReporter;
use crate::text::{split_sentences, token_counter, TokenLength};
use crate::types::{Chunk, CorpusConfig, Document};
use agro_core::AppResult;

/// Sentences carried from one chunk into the next.
pub const CARRYOVER_SENTENCES: usize = 2;

pub struct Chunker {
    counter: Box<dyn TokenLength>,
    chunk_size: usize,
    min_chunk: usize,
}

impl Chunker {
    pub fn new(counter: Box<dyn TokenLength>, chunk_size: usize, min_chunk: usize) -> Self {
        Self {
            counter,
            chunk_size,
            min_chunk,
        }
    }

    pub fn from_config(config: &CorpusConfig) -> AppResult<Self> {
        Ok(Self::new(
            token_counter(config.tokenizer)?,
            config.chunk_size,
            config.min_chunk,
        ))
    }

    /// Cut one document into chunks with ids `<name>__<seq>`.
    ///
    /// A sentence longer than the budget is emitted on its own, untruncated.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buf: Vec<(String, usize)> = Vec::new();
        let mut buf_tokens = 0usize;

        for sentence in split_sentences(&doc.text) {
            let tokens = self.counter.count(&sentence);

            if buf_tokens + tokens > self.chunk_size {
                if buf_tokens >= self.min_chunk {
                    chunks.push(Chunk::new(&doc.name, chunks.len(), join(&buf)));
                }
                let keep_from = buf.len().saturating_sub(CARRYOVER_SENTENCES);
                buf.drain(..keep_from);
                buf_tokens = buf.iter().map(|(_, t)| t).sum();
            }

            buf_tokens += tokens;
            buf.push((sentence, tokens));
        }

        if !buf.is_empty() && buf_tokens >= self.min_chunk {
            chunks.push(Chunk::new(&doc.name, chunks.len(), join(&buf)));
        }

        tracing::debug!(
            "Chunked '{}' into {} chunks (budget {}, min {})",
            doc.name,
            chunks.len(),
            self.chunk_size,
            self.min_chunk
        );

        chunks
    }

    /// Chunk a document set in order, reporting progress per document.
    pub fn chunk_documents(&self, docs: &[Document], progress: &ProgressReporter) -> Vec<Chunk> {
        let total = docs.len() as u64;
        let mut all = Vec::new();

        for (i, doc) in docs.iter().enumerate() {
            all.extend(self.chunk_document(doc));
            progress.chunk(i as u64 + 1, Some(total), all.len());
        }

        all
    }
}

fn join(buf: &[(String, usize)]) -> String {
    buf.iter()
        .map(|(s, _)| s.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::WordTokens;

    /// A sentence of exactly `n` words (n >= 3).
    fn words(n: usize, tag: &str) -> String {
        format!("Start {} end.", vec![tag; n - 2].join(" "))
    }

    fn doc(sentences: &[String]) -> Document {
        Document {
            name: "doc.txt".to_string(),
            text: sentences.join(" "),
        }
    }

    fn chunker(size: usize, min: usize) -> Chunker {
        Chunker::new(Box::new(WordTokens), size, min)
    }

    #[test]
    fn test_short_document_below_minimum_yields_nothing() {
        let chunks = chunker(400, 80).chunk_document(&doc(&[words(10, "wheat")]));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_single_chunk_when_under_budget() {
        let sentences = vec![words(50, "wheat"), words(40, "barley")];
        let chunks = chunker(400, 80).chunk_document(&doc(&sentences));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc.txt__0");
        assert_eq!(chunks[0].source, "doc.txt");
        assert_eq!(chunks[0].text, sentences.join(" "));
    }

    #[test]
    fn test_overflow_carries_last_two_sentences() {
        let s: Vec<String> = ["a", "b", "c", "d"].iter().map(|t| words(30, t)).collect();
        let chunks = chunker(100, 20).chunk_document(&doc(&s));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, format!("{} {} {}", s[0], s[1], s[2]));
        assert_eq!(chunks[1].text, format!("{} {} {}", s[1], s[2], s[3]));
    }

    #[test]
    fn test_two_sentence_buffer_is_carried_whole() {
        // A two-sentence buffer survives the flush intact, so the next chunk holds three.
        let s: Vec<String> = ["a", "b", "c", "d"].iter().map(|t| words(40, t)).collect();
        let chunks = chunker(100, 20).chunk_document(&doc(&s));

        assert_eq!(chunks[0].text, format!("{} {}", s[0], s[1]));
        assert_eq!(chunks[1].text, format!("{} {} {}", s[0], s[1], s[2]));
        assert_eq!(chunks[2].text, format!("{} {} {}", s[1], s[2], s[3]));
    }

    #[test]
    fn test_overlong_sentence_emitted_whole() {
        let long = words(150, "mustard");
        let chunks = chunker(100, 20).chunk_document(&doc(&[long.clone(), words(30, "pea")]));

        assert_eq!(chunks[0].text, long);
    }

    #[test]
    fn test_ids_are_sequential_per_document() {
        let s: Vec<String> = (0..8).map(|i| words(30, &format!("t{}", i))).collect();
        let chunks = chunker(100, 20).chunk_document(&doc(&s));

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("doc.txt__{}", i));
        }
    }
}
