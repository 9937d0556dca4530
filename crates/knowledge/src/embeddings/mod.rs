//! Embedding engine for corpora.
//!
//! Provider-agnostic embedding generation with per-corpus configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::progress::ProgressReporter;
use agro_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Creates embedding providers and caches one per corpus.
#[derive(Default)]
pub struct EmbeddingEngine {
    providers: RwLock<HashMap<String, Arc<dyn EmbeddingProvider>>>,
}

impl EmbeddingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the provider for a corpus.
    pub async fn provider(
        &self,
        corpus: &str,
        config: &EmbeddingConfig,
    ) -> AppResult<Arc<dyn EmbeddingProvider>> {
        {
            let providers = self
                .providers
                .read()
                .map_err(|_| AppError::Other("Embedding provider cache poisoned".to_string()))?;
            if let Some(provider) = providers.get(corpus) {
                return Ok(Arc::clone(provider));
            }
        }

        tracing::debug!(
            "Creating embedding provider for corpus '{}': provider={}, model={}, dimensions={}",
            corpus,
            config.provider,
            config.model,
            config.dimensions
        );

        let provider = create_provider(config).await?;

        self.providers
            .write()
            .map_err(|_| AppError::Other("Embedding provider cache poisoned".to_string()))?
            .insert(corpus.to_string(), Arc::clone(&provider));

        Ok(provider)
    }

    /// Embed texts in batches of `config.batch_size`, preserving input order.
    pub async fn embed_texts(
        &self,
        corpus: &str,
        config: &EmbeddingConfig,
        texts: &[String],
        progress: &ProgressReporter,
    ) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider(corpus, config).await?;

        tracing::info!(
            "Embedding {} texts for corpus '{}' using provider '{}' (model: {})",
            texts.len(),
            corpus,
            provider.provider_name(),
            provider.model_name()
        );

        let total = texts.len() as u64;
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(config.batch_size.max(1)) {
            let vectors = provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Capability(format!(
                    "Provider returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
            progress.embed(embeddings.len() as u64, Some(total), provider.model_name());
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            provider.dimensions()
        );

        Ok(embeddings)
    }
}
