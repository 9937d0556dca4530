//! SQLite-backed vector index.
//!
//! An index is a directory holding `index.sqlite` (chunks with their
//! embeddings, in insertion order) and `manifest.json` (embedding settings,
//! entry count, content hash). Builds are written to a staging directory and
//! swapped over the live one, so readers never see a half-written index.
//! Loaded indexes live fully in memory and are read-only.

use crate::embeddings::{EmbeddingConfig, EmbeddingEngine};
use crate::progress::ProgressReporter;
use crate::types::Chunk;
use agro_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const DB_FILE: &str = "index.sqlite";
const MANIFEST_FILE: &str = "manifest.json";

/// Describes how an index was built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub entries: usize,
    /// SHA-256 over chunk ids and texts, in order
    pub content_hash: String,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            batch_size: EmbeddingConfig::default().batch_size,
        }
    }
}

/// A chunk with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// An in-memory, read-only vector index.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    manifest: IndexManifest,
}

impl VectorIndex {
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a persisted index without recomputing any embedding.
    ///
    /// Fails if the index was built with a different embedding setup than
    /// `expected`.
    pub fn load(dir: &Path, expected: &EmbeddingConfig) -> AppResult<Self> {
        let manifest = read_manifest(dir)?;
        expected.validate_consistency(&manifest.embedding_config())?;

        let conn = Connection::open(dir.join(DB_FILE))
            .map_err(|e| AppError::Index(format!("Failed to open index at {:?}: {}", dir, e)))?;

        let mut stmt = conn
            .prepare("SELECT id, source, text, embedding FROM chunks ORDER BY seq")
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to read index: {}", e)))?;

        let mut entries = Vec::with_capacity(manifest.entries);
        for row in rows {
            let (id, source, text, bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read index row: {}", e)))?;
            entries.push(IndexEntry {
                chunk: Chunk { id, text, source },
                embedding: bytes_to_embedding(&bytes)?,
            });
        }

        if entries.len() != manifest.entries {
            return Err(AppError::Index(format!(
                "Index at {:?} has {} entries, manifest records {}",
                dir,
                entries.len(),
                manifest.entries
            )));
        }

        tracing::debug!("Loaded {} index entries from {:?}", entries.len(), dir);
        Ok(Self { entries, manifest })
    }

    /// Top-`k` entries by cosine similarity to `query`.
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        let mut scored: Vec<(&Chunk, f32)> = self
            .entries
            .iter()
            .map(|e| (&e.chunk, cosine_similarity(query, &e.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

/// Embed `chunks` and persist them as the live index in `live_dir`.
///
/// The index is written to `staging_dir` first and renamed into place.
///
/// # Errors
/// `AppError::IndexEmpty` when `chunks` is empty; the live index is untouched.
pub async fn build_index(
    chunks: &[Chunk],
    corpus: &str,
    config: &EmbeddingConfig,
    engine: &EmbeddingEngine,
    staging_dir: &Path,
    live_dir: &Path,
    progress: &ProgressReporter,
) -> AppResult<VectorIndex> {
    if chunks.is_empty() {
        return Err(AppError::IndexEmpty(format!(
            "corpus '{}' has no chunks to index",
            corpus
        )));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = engine.embed_texts(corpus, config, &texts, progress).await?;

    let entries: Vec<IndexEntry> = chunks
        .iter()
        .cloned()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
        .collect();

    let manifest = IndexManifest {
        provider: config.provider.clone(),
        model: config.model.clone(),
        dimensions: config.dimensions,
        entries: entries.len(),
        content_hash: content_hash(chunks),
        built_at: Utc::now(),
    };

    write_index(staging_dir, &entries, &manifest, progress)?;
    swap_into_place(staging_dir, live_dir)?;

    tracing::info!(
        "Index for corpus '{}' now live with {} entries",
        corpus,
        entries.len()
    );

    Ok(VectorIndex { entries, manifest })
}

fn write_index(
    dir: &Path,
    entries: &[IndexEntry],
    manifest: &IndexManifest,
    progress: &ProgressReporter,
) -> AppResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| AppError::Index(format!("Failed to clear {:?}: {}", dir, e)))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| AppError::Index(format!("Failed to create {:?}: {}", dir, e)))?;

    let mut conn = Connection::open(dir.join(DB_FILE))
        .map_err(|e| AppError::Index(format!("Failed to create SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE chunks (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL,
            source TEXT NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        );
        CREATE INDEX idx_chunks_source ON chunks(source);
        "#,
    )
    .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

    let tx = conn
        .transaction()
        .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;
    {
        let mut stmt = tx
            .prepare("INSERT INTO chunks (seq, id, source, text, embedding) VALUES (?1, ?2, ?3, ?4, ?5)")
            .map_err(|e| AppError::Index(format!("Failed to prepare insert: {}", e)))?;

        let total = entries.len() as u64;
        for (seq, entry) in entries.iter().enumerate() {
            stmt.execute(params![
                seq as i64,
                entry.chunk.id,
                entry.chunk.source,
                entry.chunk.text,
                embedding_to_bytes(&entry.embedding),
            ])
            .map_err(|e| AppError::Index(format!("Failed to insert {}: {}", entry.chunk.id, e)))?;

            if (seq + 1) % 256 == 0 || seq + 1 == entries.len() {
                progress.index(seq as u64 + 1, Some(total));
            }
        }
    }
    tx.commit()
        .map_err(|e| AppError::Index(format!("Failed to commit index: {}", e)))?;

    fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(manifest)?)
        .map_err(|e| AppError::Index(format!("Failed to write manifest: {}", e)))?;

    Ok(())
}

/// Replace `live` with `staging`. A previous live index is moved aside
/// and restored if the final rename fails.
fn swap_into_place(staging: &Path, live: &Path) -> AppResult<()> {
    let retired = live.with_extension("old");
    if retired.exists() {
        fs::remove_dir_all(&retired)
            .map_err(|e| AppError::Index(format!("Failed to clear {:?}: {}", retired, e)))?;
    }

    let had_live = live.exists();
    if had_live {
        fs::rename(live, &retired)
            .map_err(|e| AppError::Index(format!("Failed to retire {:?}: {}", live, e)))?;
    }

    if let Err(e) = fs::rename(staging, live) {
        if had_live {
            if let Err(restore) = fs::rename(&retired, live) {
                tracing::error!("Failed to restore previous index {:?}: {}", live, restore);
            }
        }
        return Err(AppError::Index(format!(
            "Failed to move {:?} into place: {}",
            staging, e
        )));
    }

    if had_live {
        if let Err(e) = fs::remove_dir_all(&retired) {
            tracing::warn!("Failed to remove retired index {:?}: {}", retired, e);
        }
    }

    Ok(())
}

/// Read the manifest of a persisted index.
pub fn read_manifest(dir: &Path) -> AppResult<IndexManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(AppError::Index(format!("No index found at {:?}", dir)));
    }
    let content = fs::read_to_string(&path)
        .map_err(|e| AppError::Index(format!("Failed to read {:?}: {}", path, e)))?;
    Ok(serde_json::from_str(&content)?)
}

/// Size on disk of an index directory.
pub fn index_size_bytes(dir: &Path) -> u64 {
    [DB_FILE, MANIFEST_FILE]
        .iter()
        .filter_map(|f| fs::metadata(dir.join(f)).ok())
        .map(|m| m.len())
        .sum()
}

fn content_hash(chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(chunk.text.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index("Invalid embedding bytes length".to_string()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("rabi.txt", 0, "Wheat and mustard are rabi crops in rainfed hills.".to_string()),
            Chunk::new("apple.txt", 0, "Apple needs chill hours and rainfall of 1000 mm.".to_string()),
            Chunk::new("drones.txt", 0, "Drones spray pesticides over terraced fields.".to_string()),
        ]
    }

    async fn build(dir: &TempDir, chunks: &[Chunk]) -> AppResult<VectorIndex> {
        build_index(
            chunks,
            "hills",
            &EmbeddingConfig::default(),
            &EmbeddingEngine::new(),
            &dir.path().join("index.staging"),
            &dir.path().join("index"),
            &ProgressReporter::noop(),
        )
        .await
    }

    #[tokio::test]
    async fn test_build_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let built = build(&dir, &chunks()).await.unwrap();

        assert!(dir.path().join("index").join(DB_FILE).exists());
        assert!(!dir.path().join("index.staging").exists());

        let loaded = VectorIndex::load(&dir.path().join("index"), &EmbeddingConfig::default()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.manifest(), built.manifest());
        assert_eq!(loaded.entries[1].chunk.id, "apple.txt__0");
        assert_eq!(loaded.entries[1].embedding, built.entries[1].embedding);
    }

    #[tokio::test]
    async fn test_empty_build_is_index_empty_and_keeps_live() {
        let dir = TempDir::new().unwrap();
        build(&dir, &chunks()).await.unwrap();

        let result = build(&dir, &[]).await;
        assert!(matches!(result, Err(AppError::IndexEmpty(_))));

        let live = VectorIndex::load(&dir.path().join("index"), &EmbeddingConfig::default()).unwrap();
        assert_eq!(live.len(), 3);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_live_index() {
        let dir = TempDir::new().unwrap();
        build(&dir, &chunks()).await.unwrap();
        build(&dir, &chunks()[..1]).await.unwrap();

        let live = VectorIndex::load(&dir.path().join("index"), &EmbeddingConfig::default()).unwrap();
        assert_eq!(live.len(), 1);
        assert!(!dir.path().join("index.old").exists());
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let dir = TempDir::new().unwrap();
        let index = build(&dir, &chunks()).await.unwrap();
        let engine = EmbeddingEngine::new();
        let provider = engine.provider("hills", &EmbeddingConfig::default()).await.unwrap();

        let query = provider.embed("apple rainfall chill").await.unwrap();
        let hits = index.search(&query, 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "apple.txt__0");
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let index = build(&dir, &chunks()).await.unwrap();

        // A zero query scores every entry 0.0.
        let hits = index.search(&[0.0; 384], 3);
        let ids: Vec<&str> = hits.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(ids, vec!["rabi.txt__0", "apple.txt__0", "drones.txt__0"]);
    }

    #[tokio::test]
    async fn test_load_rejects_mismatched_embedding_config() {
        let dir = TempDir::new().unwrap();
        build(&dir, &chunks()).await.unwrap();

        let other = EmbeddingConfig {
            dimensions: 768,
            ..EmbeddingConfig::default()
        };
        assert!(VectorIndex::load(&dir.path().join("index"), &other).is_err());
    }

    #[test]
    fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let result = VectorIndex::load(&dir.path().join("index"), &EmbeddingConfig::default());
        assert!(matches!(result, Err(AppError::Index(_))));
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
