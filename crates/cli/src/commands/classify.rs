//! Classify command handler.
//!
//! Shows how a question is routed without touching the corpus.

use super::print_json;
use agro_core::config::AppConfig;
use agro_knowledge::config::load_config;
use agro_knowledge::rag::{classify, expand};
use clap::Args;

/// Show intent flags and the expanded search query for a question
#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// The question to classify
    pub query: String,

    /// Region appended during expansion (default: the corpus region)
    #[arg(long)]
    pub region: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClassifyCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => load_config(&config.workspace, &config.corpus)?.region,
        };
        let flags = classify(&self.query);
        let expanded = expand(&self.query, &flags, &region);

        if self.json {
            return print_json(&serde_json::json!({
                "query": self.query,
                "flags": flags,
                "expandedQuery": expanded,
            }));
        }

        let active = flags.active();
        if active.is_empty() {
            println!("Intent: (none)");
        } else {
            println!("Intent: {}", active.join(", "));
        }
        println!("Expanded query: {}", expanded);
        Ok(())
    }
}
