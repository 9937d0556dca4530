//! Evidence-qualified question answering.
//!
//! Answers are assembled from extracted spans and numeric evidence found in
//! retrieved chunks. No text is generated: every figure in an answer is
//! quoted with the sentence it came from.

pub mod answer;
pub mod classify;
pub mod expand;
pub mod extract;
pub mod numeric;
pub mod retrieve;
pub mod synthesize;
pub mod types;

pub use answer::{AnswerPipeline, AnswerTrace, NO_RELEVANT_DOCUMENTS};
pub use classify::{classify, IntentFlags};
pub use expand::expand;
pub use types::{
    CitedSource, ExtractedAnswer, NumericEvidence, NumericLabel, RetrievedCandidate,
    SynthesizedAnswer,
};
