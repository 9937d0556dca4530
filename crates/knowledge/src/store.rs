//! Chunk record persistence.
//!
//! Records live in `chunks.jsonl`, one `{id, text, metadata: {source}}`
//! object per line, in chunking order.

use crate::config::get_records_path;
use crate::types::Chunk;
use agro_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct ChunkRecord {
    id: String,
    text: String,
    metadata: RecordMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordMetadata {
    source: String,
}

impl From<&Chunk> for ChunkRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            text: chunk.text.clone(),
            metadata: RecordMetadata {
                source: chunk.source.clone(),
            },
        }
    }
}

impl From<ChunkRecord> for Chunk {
    fn from(record: ChunkRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            source: record.metadata.source,
        }
    }
}

/// Append-only chunk record file for one corpus.
pub struct ChunkStore {
    path: PathBuf,
}

impl ChunkStore {
    pub fn new(workspace: &Path, corpus: &str) -> Self {
        Self {
            path: get_records_path(workspace, corpus),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append chunks to the record file.
    pub fn append(&self, chunks: &[Chunk]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Index(format!("Failed to open {:?}: {}", self.path, e)))?;
        let mut writer = BufWriter::new(file);

        for chunk in chunks {
            let line = serde_json::to_string(&ChunkRecord::from(chunk))?;
            writeln!(writer, "{}", line)
                .map_err(|e| AppError::Index(format!("Failed to write {:?}: {}", self.path, e)))?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| AppError::Index(format!("Failed to flush {:?}: {}", self.path, e)))?;
        file.sync_all()
            .map_err(|e| AppError::Index(format!("Failed to sync {:?}: {}", self.path, e)))?;

        tracing::debug!("Appended {} chunk records to {:?}", chunks.len(), self.path);
        Ok(())
    }

    /// Read every record in file order. Records with empty text are skipped.
    pub fn list(&self) -> AppResult<Vec<Chunk>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Index(format!("Failed to open {:?}: {}", self.path, e)))?;

        let mut chunks = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Index(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: ChunkRecord = serde_json::from_str(&line).map_err(|e| {
                AppError::Index(format!(
                    "Failed to parse line {} in {:?}: {}",
                    line_num + 1,
                    self.path,
                    e
                ))
            })?;

            if record.text.trim().is_empty() {
                continue;
            }
            chunks.push(record.into());
        }

        tracing::debug!("Read {} chunk records from {:?}", chunks.len(), self.path);
        Ok(chunks)
    }

    /// Remove the record file.
    pub fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| AppError::Index(format!("Failed to delete {:?}: {}", self.path, e)))?;
            tracing::debug!("Cleared {:?}", self.path);
        }
        Ok(())
    }

    /// Replace all records with `chunks`.
    pub fn rewrite(&self, chunks: &[Chunk]) -> AppResult<()> {
        self.clear()?;
        self.append(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(source: &str, seq: usize, text: &str) -> Chunk {
        Chunk::new(source, seq, text.to_string())
    }

    #[test]
    fn test_append_and_list_preserves_order() {
        let temp = TempDir::new().unwrap();
        let store = ChunkStore::new(temp.path(), "hills");

        store.append(&[chunk("a.txt", 0, "Wheat."), chunk("a.txt", 1, "Barley.")]).unwrap();
        store.append(&[chunk("b.txt", 0, "Apple.")]).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a.txt__0", "a.txt__1", "b.txt__0"]);
    }

    #[test]
    fn test_record_shape_on_disk() {
        let temp = TempDir::new().unwrap();
        let store = ChunkStore::new(temp.path(), "hills");
        store.append(&[chunk("a.txt", 0, "Wheat.")]).unwrap();

        let line = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["id"], "a.txt__0");
        assert_eq!(value["metadata"]["source"], "a.txt");
    }

    #[test]
    fn test_empty_text_records_skipped() {
        let temp = TempDir::new().unwrap();
        let store = ChunkStore::new(temp.path(), "hills");
        store.append(&[chunk("a.txt", 0, "  "), chunk("a.txt", 1, "Pea.")]).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        let store = ChunkStore::new(temp.path(), "hills");
        store.append(&[chunk("a.txt", 0, "Wheat.")]).unwrap();
        let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
        writeln!(file, "{{not json").unwrap();

        let err = store.list().unwrap_err().to_string();
        assert!(err.contains("line 2"), "{}", err);
    }

    #[test]
    fn test_rewrite_replaces_records() {
        let temp = TempDir::new().unwrap();
        let store = ChunkStore::new(temp.path(), "hills");
        store.append(&[chunk("a.txt", 0, "Old.")]).unwrap();
        store.rewrite(&[chunk("b.txt", 0, "New.")]).unwrap();

        let chunks = store.list().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "New.");
    }
}
