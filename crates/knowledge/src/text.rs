//! Sentence splitting and token counting.

use crate::types::Tokenizer;
use agro_core::{AppError, AppResult};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use unicode_segmentation::UnicodeSegmentation;

/// Split text into trimmed, non-empty sentences using Unicode sentence
/// boundaries. Deterministic: the same input always yields the same list.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Measures text length in the unit chunk budgets are expressed in.
pub trait TokenLength: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// GPT-2 byte-pair token counts (`r50k_base`).
#[derive(Clone)]
pub struct Gpt2Tokens {
    bpe: Arc<CoreBPE>,
}

impl Gpt2Tokens {
    pub fn new() -> AppResult<Self> {
        let bpe = tiktoken_rs::r50k_base()
            .map_err(|e| AppError::Other(format!("Failed to load GPT-2 tokenizer: {}", e)))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenLength for Gpt2Tokens {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Whitespace-separated word counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokens;

impl TokenLength for WordTokens {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Build the counter a corpus is configured for.
pub fn token_counter(tokenizer: Tokenizer) -> AppResult<Box<dyn TokenLength>> {
    match tokenizer {
        Tokenizer::Gpt2 => Ok(Box::new(Gpt2Tokens::new()?)),
        Tokenizer::Words => Ok(Box::new(WordTokens)),
    }
}
