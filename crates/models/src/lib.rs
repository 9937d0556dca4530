//! External model capabilities for the agro query pipeline.
//!
//! The pipeline needs two capabilities beyond embeddings: a relevance
//! reranker scoring (question, passage) pairs, and an extractive reader
//! returning the best answer span from a passage. Both sit behind traits so
//! the pipeline can be built with HTTP model servers, local heuristics, or
//! test doubles.
//!
//! # Providers
//! - **http**: a model server (cross-encoder `/rerank`, question answering `/qa`)
//! - **lexical**: in-process term-overlap scoring, no model required
//!
//! # Example
//! ```no_run
//! use agro_models::{ExtractiveReader, providers::LexicalReader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = LexicalReader::new();
//! let span = reader
//!     .answer("Which crops suit rainfed areas?", "Wheat and mustard suit rainfed areas.", 120)
//!     .await?;
//! println!("{} ({:.2})", span.answer, span.score);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{ExtractiveReader, QaAnswer, Reranker};
pub use factory::{create_reader, create_reranker};
