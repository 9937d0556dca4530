//! Embedding configuration derived from corpus settings.

use crate::types::CorpusConfig;
use agro_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding settings for one corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Texts per provider call during builds
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_corpus(&CorpusConfig::default())
    }
}

impl EmbeddingConfig {
    pub fn from_corpus(corpus: &CorpusConfig) -> Self {
        Self {
            provider: corpus.provider.clone(),
            model: corpus.model.clone(),
            dimensions: corpus.embedding_dim,
            batch_size: corpus.embed_batch_size,
        }
    }

    /// Check that vectors produced under `other` are comparable with ours.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Index(format!(
                "Provider mismatch: index built with '{}', corpus configured for '{}'",
                other.provider, self.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Index(format!(
                "Model mismatch: index built with '{}', corpus configured for '{}'",
                other.model, self.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Index(format!(
                "Dimension mismatch: index has {}, corpus configured for {}",
                other.dimensions, self.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_validate_consistency_success() {
        let config = EmbeddingConfig::default();
        assert!(config.validate_consistency(&config.clone()).is_ok());
    }

    #[test]
    fn test_batch_size_does_not_affect_consistency() {
        let config = EmbeddingConfig::default();
        let other = EmbeddingConfig {
            batch_size: 8,
            ..config.clone()
        };
        assert!(config.validate_consistency(&other).is_ok());
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config = EmbeddingConfig::default();
        let other = EmbeddingConfig {
            dimensions: 768,
            ..config.clone()
        };

        let err = config.validate_consistency(&other).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }
}
