//! Ask command handler.
//!
//! Answers a question from the indexed corpus with cited sources.

use super::print_json;
use agro_core::config::AppConfig;
use agro_knowledge::rag::AnswerTrace;
use anyhow::Context;
use clap::Args;

/// Ask a question against the corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Include intent flags, candidates and extracted evidence
    #[arg(long)]
    pub explain: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command against corpus '{}'", config.corpus);

        let pipeline =
            agro_knowledge::open_pipeline(&config.workspace, &config.corpus, &config.models)
                .await
                .with_context(|| format!("Failed to open corpus '{}'", config.corpus))?;

        let trace = pipeline.explain(&self.query).await;

        match (self.json, self.explain) {
            (true, true) => print_json(&trace)?,
            (true, false) => print_json(&trace.answer)?,
            (false, explain) => print_human(&trace, explain),
        }
        Ok(())
    }
}

fn print_human(trace: &AnswerTrace, explain: bool) {
    if explain {
        println!("Intent: {}", trace.flags.active().join(", "));
        println!("Expanded query: {}", trace.expanded_query);
        println!("Rule: {}", trace.rule.unwrap_or("none"));
        println!("Candidates:");
        for candidate in &trace.candidates {
            println!("  {:>8.3}  {}", candidate.relevance_score, candidate.chunk.id);
        }
        println!();
    }

    println!("{}", trace.answer.answer);
    println!();

    if trace.answer.sources.is_empty() {
        println!("Sources: (none)");
        return;
    }

    println!("Sources:");
    for source in &trace.answer.sources {
        let kind = if source.has_span { "answer" } else { "context" };
        println!("- {} [{}]: {}", source.source, kind, source.snippet);
    }
}
