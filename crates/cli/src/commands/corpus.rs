//! Corpus command handler.
//!
//! Chunking, index builds and housekeeping for one corpus.

use super::{print_json, progress_reporter};
use agro_core::config::AppConfig;
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Corpus management
#[derive(Args, Debug)]
pub struct CorpusCommand {
    #[command(subcommand)]
    pub action: CorpusAction,
}

#[derive(Subcommand, Debug)]
pub enum CorpusAction {
    /// Split documents into chunk records
    Chunk(CorpusChunkCommand),
    /// Embed chunk records into a fresh index
    Index(CorpusIndexCommand),
    /// Chunk documents and index them in one step
    Build(CorpusChunkCommand),
    /// Show what is stored for the corpus
    Stats(CorpusStatsCommand),
    /// Delete chunk records and indexes (keeps config)
    Clean,
}

/// Chunk a document directory
#[derive(Args, Debug)]
pub struct CorpusChunkCommand {
    /// Directory (or single file) of .txt / .md documents
    pub docs: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Build the index from chunk records
#[derive(Args, Debug)]
pub struct CorpusIndexCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Show corpus statistics
#[derive(Args, Debug)]
pub struct CorpusStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusChunkCommand {
    fn chunk(&self, config: &AppConfig) -> anyhow::Result<()> {
        let progress = progress_reporter(self.json);
        let stats =
            agro_knowledge::chunk_corpus(&config.workspace, &config.corpus, &self.docs, &progress)
                .with_context(|| format!("Failed to chunk documents in {:?}", self.docs))?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Chunked {} documents into {} chunks ({} bytes) in {:.2}s",
                stats.documents, stats.chunks, stats.bytes_processed, stats.duration_secs
            );
        }
        Ok(())
    }

    async fn build(&self, config: &AppConfig) -> anyhow::Result<()> {
        let progress = progress_reporter(self.json);
        let chunked =
            agro_knowledge::chunk_corpus(&config.workspace, &config.corpus, &self.docs, &progress)
                .with_context(|| format!("Failed to chunk documents in {:?}", self.docs))?;
        let indexed =
            agro_knowledge::build_corpus_index(&config.workspace, &config.corpus, &progress)
                .await
                .context("Failed to build index")?;

        if self.json {
            print_json(&serde_json::json!({
                "corpus": config.corpus,
                "chunking": chunked,
                "index": indexed,
            }))?;
        } else {
            println!(
                "Corpus '{}': {} documents, {} chunks, {} index entries ({}/{}, {} dims)",
                config.corpus,
                chunked.documents,
                chunked.chunks,
                indexed.entries,
                indexed.provider,
                indexed.model,
                indexed.dimensions
            );
        }
        Ok(())
    }
}

impl CorpusIndexCommand {
    async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let progress = progress_reporter(self.json);
        let stats = agro_knowledge::build_corpus_index(&config.workspace, &config.corpus, &progress)
            .await
            .context("Failed to build index")?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Indexed {} chunks with {}/{} ({} dims) in {:.2}s",
                stats.entries, stats.provider, stats.model, stats.dimensions, stats.duration_secs
            );
        }
        Ok(())
    }
}

impl CorpusStatsCommand {
    fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let stats = agro_knowledge::stats(&config.workspace, &config.corpus)?;

        if self.json {
            return print_json(&stats);
        }

        println!("Corpus: {}", stats.corpus);
        println!("  Documents: {}", stats.documents);
        println!("  Chunks: {}", stats.chunks);
        println!("  Records size: {} bytes", stats.records_size_bytes);
        match stats.index_entries {
            Some(entries) => {
                println!("  Index entries: {}", entries);
                println!("  Index size: {} bytes", stats.index_size_bytes);
            }
            None => println!("  Index: not built"),
        }
        if let Some(built_at) = stats.built_at {
            println!("  Built at: {}", built_at);
        }
        Ok(())
    }
}

impl CorpusCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing corpus command for '{}'", config.corpus);

        match &self.action {
            CorpusAction::Chunk(cmd) => cmd.chunk(config),
            CorpusAction::Index(cmd) => cmd.execute(config).await,
            CorpusAction::Build(cmd) => cmd.build(config).await,
            CorpusAction::Stats(cmd) => cmd.execute(config),
            CorpusAction::Clean => {
                agro_knowledge::clean(&config.workspace, &config.corpus)?;
                println!("Corpus '{}' cleaned", config.corpus);
                Ok(())
            }
        }
    }
}
