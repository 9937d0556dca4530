//! Command handlers for the agro CLI.

pub mod ask;
pub mod classify;
pub mod corpus;

pub use ask::AskCommand;
pub use classify::ClassifyCommand;
pub use corpus::CorpusCommand;

use agro_knowledge::{ProgressEvent, ProgressReporter};
use std::sync::Arc;

/// Progress lines on stderr, or nothing when output must stay machine-readable.
pub(crate) fn progress_reporter(quiet: bool) -> ProgressReporter {
    if quiet {
        return ProgressReporter::noop();
    }
    ProgressReporter::new(Arc::new(|event: ProgressEvent| {
        eprintln!("{}", event.format_simple());
    }))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
