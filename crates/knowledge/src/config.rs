//! Corpus configuration and on-disk layout.
//!
//! ```text
//! .agro/corpus/<name>/
//!   config.yaml      corpus settings
//!   chunks.jsonl     chunk records
//!   index/           live vector index
//!   index.staging/   index being built
//! ```

use crate::types::CorpusConfig;
use agro_core::config::STATE_DIR;
use agro_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load corpus configuration.
///
/// Reads `.agro/corpus/<name>/config.yaml` if present, otherwise returns
/// defaults carrying the corpus name.
pub fn load_config(workspace: &Path, corpus: &str) -> AppResult<CorpusConfig> {
    let config_path = get_config_path(workspace, corpus);

    if !config_path.exists() {
        tracing::debug!(
            "Using default corpus config for '{}' (no config file found)",
            corpus
        );
        return Ok(CorpusConfig {
            name: corpus.to_string(),
            ..Default::default()
        });
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let mut config: CorpusConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;
    config.name = corpus.to_string();

    validate(&config)?;

    tracing::debug!("Loaded corpus config for '{}'", corpus);
    Ok(config)
}

/// Save corpus configuration.
pub fn save_config(workspace: &Path, config: &CorpusConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Config(format!("Failed to create corpus directory: {}", e)))?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved corpus config for '{}'", config.name);
    Ok(())
}

fn validate(config: &CorpusConfig) -> AppResult<()> {
    if config.chunk_size == 0 || config.min_chunk > config.chunk_size {
        return Err(AppError::Config(format!(
            "chunk_size ({}) must be positive and at least min_chunk ({})",
            config.chunk_size, config.min_chunk
        )));
    }
    if config.top_k == 0 || config.rerank_top == 0 {
        return Err(AppError::Config(
            "top_k and rerank_top must be greater than zero".to_string(),
        ));
    }
    if config.workers == 0 || config.embed_batch_size == 0 || config.embedding_dim == 0 {
        return Err(AppError::Config(
            "workers, embed_batch_size and embedding_dim must be greater than zero".to_string(),
        ));
    }
    if config.capability_timeout_secs == 0 {
        return Err(AppError::Config(
            "capability_timeout_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Get the directory holding everything for a corpus.
pub fn get_corpus_dir(workspace: &Path, corpus: &str) -> PathBuf {
    workspace.join(STATE_DIR).join("corpus").join(corpus)
}

/// Get the path to a corpus config file.
pub fn get_config_path(workspace: &Path, corpus: &str) -> PathBuf {
    get_corpus_dir(workspace, corpus).join("config.yaml")
}

/// Get the chunk records path.
pub fn get_records_path(workspace: &Path, corpus: &str) -> PathBuf {
    get_corpus_dir(workspace, corpus).join("chunks.jsonl")
}

/// Get the live index directory.
pub fn get_index_dir(workspace: &Path, corpus: &str) -> PathBuf {
    get_corpus_dir(workspace, corpus).join("index")
}

/// Get the directory an index is built in before it goes live.
pub fn get_staging_dir(workspace: &Path, corpus: &str) -> PathBuf {
    get_corpus_dir(workspace, corpus).join("index.staging")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tokenizer;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "hills").unwrap();

        assert_eq!(config.name, "hills");
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.chunk_size, 400);
        assert_eq!(config.top_k, 20);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = CorpusConfig {
            name: "hills".to_string(),
            tokenizer: Tokenizer::Words,
            chunk_size: 120,
            min_chunk: 20,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "hills").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_min_chunk_above_chunk_size_rejected() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "hills");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "name: hills\nchunk_size: 50\nmin_chunk: 80\n").unwrap();

        assert!(matches!(load_config(temp.path(), "hills"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_capability_timeout_rejected() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "hills");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "name: hills\ncapability_timeout_secs: 0\n").unwrap();

        assert!(matches!(load_config(temp.path(), "hills"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_layout() {
        let ws = Path::new("/ws");
        assert_eq!(get_records_path(ws, "c"), PathBuf::from("/ws/.agro/corpus/c/chunks.jsonl"));
        assert_eq!(get_index_dir(ws, "c"), PathBuf::from("/ws/.agro/corpus/c/index"));
        assert_eq!(get_staging_dir(ws, "c"), PathBuf::from("/ws/.agro/corpus/c/index.staging"));
    }
}
