//! Agricultural corpus management and evidence-qualified answering.
//!
//! Build time: documents → chunk records → vector index.
//! Query time: see [`rag::AnswerPipeline`].

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod progress;
pub mod rag;
pub mod store;
pub mod text;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{AnswerPipeline, AnswerTrace, IntentFlags, SynthesizedAnswer};
pub use store::ChunkStore;
pub use types::{Chunk, ChunkStats, CorpusConfig, CorpusStats, Document, IndexStats, Tokenizer};

use agro_core::{AppError, AppResult, ModelsConfig};
use chunker::Chunker;
use embeddings::{EmbeddingConfig, EmbeddingEngine};
use index::VectorIndex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use vector_index::IndexSearcher;

/// Chunk every document under `docs_dir` and replace the corpus records.
///
/// Writes the corpus config with defaults on first use.
pub fn chunk_corpus(
    workspace: &Path,
    corpus: &str,
    docs_dir: &Path,
    progress: &ProgressReporter,
) -> AppResult<ChunkStats> {
    let start = Instant::now();
    tracing::info!("Chunking documents under {:?} into corpus '{}'", docs_dir, corpus);

    let corpus_config = config::load_config(workspace, corpus)?;
    if !config::get_config_path(workspace, corpus).exists() {
        config::save_config(workspace, &corpus_config)?;
    }

    let documents = parser::load_documents(docs_dir, progress)?;
    let bytes_processed = documents.iter().map(|d| d.text.len() as u64).sum();

    let chunker = Chunker::from_config(&corpus_config)?;
    let chunks = chunker.chunk_documents(&documents, progress);

    ChunkStore::new(workspace, corpus).rewrite(&chunks)?;

    let stats = ChunkStats {
        documents: documents.len(),
        chunks: chunks.len(),
        bytes_processed,
        duration_secs: start.elapsed().as_secs_f64(),
    };
    progress.complete(&format!(
        "Chunked {} documents into {} chunks",
        stats.documents, stats.chunks
    ));

    tracing::info!(
        "Corpus '{}': {} documents, {} chunks in {:.2}s",
        corpus,
        stats.documents,
        stats.chunks,
        stats.duration_secs
    );
    Ok(stats)
}

/// Embed the corpus records and swap a fresh index into place.
///
/// # Errors
/// `AppError::IndexEmpty` if the corpus has no chunk records.
pub async fn build_corpus_index(
    workspace: &Path,
    corpus: &str,
    progress: &ProgressReporter,
) -> AppResult<IndexStats> {
    let start = Instant::now();
    let corpus_config = config::load_config(workspace, corpus)?;
    let chunks = ChunkStore::new(workspace, corpus).list()?;

    tracing::info!("Building index for corpus '{}' from {} chunks", corpus, chunks.len());

    let embedding_config = EmbeddingConfig::from_corpus(&corpus_config);
    let engine = EmbeddingEngine::new();
    let index = index::build_index(
        &chunks,
        corpus,
        &embedding_config,
        &engine,
        &config::get_staging_dir(workspace, corpus),
        &config::get_index_dir(workspace, corpus),
        progress,
    )
    .await?;

    let manifest = index.manifest();
    let stats = IndexStats {
        entries: index.len(),
        dimensions: manifest.dimensions,
        provider: manifest.provider.clone(),
        model: manifest.model.clone(),
        duration_secs: start.elapsed().as_secs_f64(),
    };
    progress.complete(&format!("Indexed {} chunks", stats.entries));
    Ok(stats)
}

/// Load the corpus index and wire up the answering capabilities.
///
/// A reranker or reader that cannot be constructed is left out with a
/// warning; the pipeline then uses its fallbacks.
pub async fn open_pipeline(
    workspace: &Path,
    corpus: &str,
    models: &ModelsConfig,
) -> AppResult<AnswerPipeline> {
    let corpus_config = config::load_config(workspace, corpus)?;
    let index_dir = config::get_index_dir(workspace, corpus);
    if !index_dir.exists() {
        return Err(AppError::Index(format!(
            "Corpus '{}' has no index. Run 'agro corpus build' first.",
            corpus
        )));
    }

    let embedding_config = EmbeddingConfig::from_corpus(&corpus_config);
    let index = VectorIndex::load(&index_dir, &embedding_config)?;
    let provider = EmbeddingEngine::new()
        .provider(corpus, &embedding_config)
        .await?;

    let reranker = agro_models::create_reranker(&models.reranker).unwrap_or_else(|e| {
        tracing::warn!("Reranker unavailable, using index order: {}", e);
        None
    });
    let reader = agro_models::create_reader(&models.reader).unwrap_or_else(|e| {
        tracing::warn!("Reader unavailable, using numeric evidence only: {}", e);
        None
    });

    tracing::info!(
        "Opened corpus '{}' ({} entries, reranker: {}, reader: {})",
        corpus,
        index.len(),
        reranker.as_ref().map(|r| r.provider_name()).unwrap_or("none"),
        reader.as_ref().map(|r| r.provider_name()).unwrap_or("none")
    );

    Ok(
        AnswerPipeline::new(Arc::new(IndexSearcher::new(index, provider)), corpus_config)
            .with_reranker(reranker)
            .with_reader(reader),
    )
}

/// Describe what is on disk for a corpus.
pub fn stats(workspace: &Path, corpus: &str) -> AppResult<CorpusStats> {
    let corpus_dir = config::get_corpus_dir(workspace, corpus);
    if !corpus_dir.exists() {
        return Err(AppError::Config(format!("Corpus '{}' does not exist", corpus)));
    }

    let store = ChunkStore::new(workspace, corpus);
    let chunks = store.list()?;
    let documents = chunks
        .iter()
        .map(|c| c.source.as_str())
        .collect::<HashSet<_>>()
        .len();
    let records_size_bytes = std::fs::metadata(store.path()).map(|m| m.len()).unwrap_or(0);

    let index_dir = config::get_index_dir(workspace, corpus);
    let manifest = index::read_manifest(&index_dir).ok();

    Ok(CorpusStats {
        corpus: corpus.to_string(),
        documents,
        chunks: chunks.len(),
        index_entries: manifest.as_ref().map(|m| m.entries),
        records_size_bytes,
        index_size_bytes: index::index_size_bytes(&index_dir),
        built_at: manifest.map(|m| m.built_at),
    })
}

/// Delete chunk records and indexes, keeping the corpus config.
pub fn clean(workspace: &Path, corpus: &str) -> AppResult<()> {
    let corpus_dir = config::get_corpus_dir(workspace, corpus);
    if !corpus_dir.exists() {
        return Err(AppError::Config(format!("Corpus '{}' does not exist", corpus)));
    }

    tracing::info!("Cleaning corpus '{}'", corpus);
    ChunkStore::new(workspace, corpus).clear()?;

    for dir in [
        config::get_index_dir(workspace, corpus),
        config::get_staging_dir(workspace, corpus),
    ] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .map_err(|e| AppError::Index(format!("Failed to delete {:?}: {}", dir, e)))?;
        }
    }

    Ok(())
}
