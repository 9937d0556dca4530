//! Capability provider factory.
//!
//! Turns a `CapabilityConfig` into a ready client. `provider: none` yields
//! `Ok(None)`; the query pipeline then runs its documented fallbacks.

use crate::client::{ExtractiveReader, Reranker};
use crate::providers::http::DEFAULT_TIMEOUT_SECS;
use crate::providers::{HttpReader, HttpReranker, LexicalReader, TermOverlapReranker};
use agro_core::CapabilityConfig;
use std::sync::Arc;

/// Create the reranker described by `config`.
///
/// # Errors
/// Returns an error message if the HTTP client cannot be built.
pub fn create_reranker(config: &CapabilityConfig) -> Result<Option<Arc<dyn Reranker>>, String> {
    match config {
        CapabilityConfig::Http {
            endpoint,
            model,
            timeout_secs,
        } => {
            let reranker = HttpReranker::new(
                endpoint,
                model.clone(),
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            )
            .map_err(|e| e.to_string())?;
            Ok(Some(Arc::new(reranker)))
        }
        CapabilityConfig::Lexical => Ok(Some(Arc::new(TermOverlapReranker::new()))),
        CapabilityConfig::None => Ok(None),
    }
}

/// Create the extractive reader described by `config`.
///
/// # Errors
/// Returns an error message if the HTTP client cannot be built.
pub fn create_reader(
    config: &CapabilityConfig,
) -> Result<Option<Arc<dyn ExtractiveReader>>, String> {
    match config {
        CapabilityConfig::Http {
            endpoint,
            model,
            timeout_secs,
        } => {
            let reader = HttpReader::new(
                endpoint,
                model.clone(),
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            )
            .map_err(|e| e.to_string())?;
            Ok(Some(Arc::new(reader)))
        }
        CapabilityConfig::Lexical => Ok(Some(Arc::new(LexicalReader::new()))),
        CapabilityConfig::None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_lexical_reranker() {
        let reranker = create_reranker(&CapabilityConfig::Lexical).unwrap();
        assert_eq!(reranker.unwrap().provider_name(), "lexical");
    }

    #[test]
    fn test_create_http_reader() {
        let config = CapabilityConfig::Http {
            endpoint: "http://localhost:9000".to_string(),
            model: Some("deepset/roberta-base-squad2".to_string()),
            timeout_secs: Some(5),
        };
        let reader = create_reader(&config).unwrap();
        assert_eq!(reader.unwrap().provider_name(), "http");
    }

    #[test]
    fn test_disabled_capability_is_none() {
        assert!(create_reranker(&CapabilityConfig::None).unwrap().is_none());
        assert!(create_reader(&CapabilityConfig::None).unwrap().is_none());
    }
}
