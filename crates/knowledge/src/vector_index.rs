//! Text-level nearest-neighbour search.
//!
//! The query pipeline only needs "text in, ranked chunks out". The trait
//! keeps it independent of how vectors are produced and stored.

use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::types::Chunk;
use agro_core::AppResult;
use std::sync::Arc;

/// Nearest-neighbour search over chunks by query text.
#[async_trait::async_trait]
pub trait ChunkSearch: Send + Sync {
    /// Up to `k` chunks, most similar first; ties in insertion order.
    async fn search(&self, query_text: &str, k: usize) -> AppResult<Vec<Chunk>>;
}

/// A loaded index paired with the provider that embedded it.
pub struct IndexSearcher {
    index: VectorIndex,
    provider: Arc<dyn EmbeddingProvider>,
}

impl IndexSearcher {
    pub fn new(index: VectorIndex, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, provider }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[async_trait::async_trait]
impl ChunkSearch for IndexSearcher {
    async fn search(&self, query_text: &str, k: usize) -> AppResult<Vec<Chunk>> {
        let query = self.provider.embed(query_text).await?;
        let hits = self.index.search(&query, k);

        if let Some((_, top)) = hits.first() {
            tracing::debug!("Vector search returned {} hits (top score {:.3})", hits.len(), top);
        }

        Ok(hits.into_iter().map(|(chunk, _)| chunk.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingConfig, EmbeddingEngine};
    use crate::index::build_index;
    use crate::progress::ProgressReporter;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_search_by_text() {
        let dir = TempDir::new().unwrap();
        let engine = EmbeddingEngine::new();
        let config = EmbeddingConfig::default();
        let chunks = vec![
            Chunk::new("a.txt", 0, "Drones spray pesticides.".to_string()),
            Chunk::new("b.txt", 0, "Mustard and barley grow in rainfed winter fields.".to_string()),
        ];
        let index = build_index(
            &chunks,
            "hills",
            &config,
            &engine,
            &dir.path().join("staging"),
            &dir.path().join("live"),
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();

        let provider = engine.provider("hills", &config).await.unwrap();
        let searcher = IndexSearcher::new(index, provider);

        let hits = searcher.search("rainfed mustard barley", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "b.txt");
    }
}
