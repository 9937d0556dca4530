//! Source document discovery and text extraction.
//!
//! Documents arrive as pre-extracted text (PDF conversion happens upstream).
//! Every document is reduced to a single line of text with whitespace runs
//! collapsed, so sentence splitting sees no layout artifacts.

use crate::progress::ProgressReporter;
use crate::types::Document;
use agro_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") | Some("text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read one file and return its normalized text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

    if raw.contains('\0') {
        return Err(AppError::Ingestion(format!("Binary file not supported: {:?}", path)));
    }

    let text = match ContentType::from_path(path) {
        ContentType::Markdown => clean_markdown(&raw),
        _ => raw,
    };

    Ok(normalize_text(&text))
}

/// Strip heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result
}

/// Find supported files under `root` (or `root` itself), sorted by path.
pub fn discover_files(root: &Path) -> AppResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(AppError::Ingestion(format!(
            "Document path does not exist: {:?}",
            root
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| ContentType::from_path(p).is_supported())
        .collect();

    files.sort();
    Ok(files)
}

/// Name a document by its path under `root`, with `/` separators.
///
/// Falls back to the file name when `root` is the file itself.
pub fn document_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    if parts.is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    } else {
        parts.join("/")
    }
}

/// Load every usable document under `root`.
///
/// Unreadable, binary and empty files are skipped with a warning.
///
/// # Errors
/// `AppError::Ingestion` if nothing usable is found.
pub fn load_documents(root: &Path, progress: &ProgressReporter) -> AppResult<Vec<Document>> {
    let files = discover_files(root)?;
    let total = files.len() as u64;
    progress.discover(total, Some(total), &root.to_string_lossy());

    let mut documents = Vec::with_capacity(files.len());
    for (i, path) in files.iter().enumerate() {
        let name = document_name(root, path);
        progress.parse(i as u64 + 1, Some(total), &name);

        match parse_file(path) {
            Ok(text) if !text.is_empty() => documents.push(Document { name, text }),
            Ok(_) => tracing::warn!("Skipping empty document: {:?}", path),
            Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
        }
    }

    if documents.is_empty() {
        return Err(AppError::Ingestion(format!(
            "No source documents found under {:?} (expected .txt or .md files)",
            root
        )));
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), root);
    Ok(documents)
}
