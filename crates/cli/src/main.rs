//! agro CLI
//!
//! Builds agricultural document corpora and answers questions from them
//! with verbatim, cited evidence.

mod commands;

use agro_core::{config::AppConfig, logging};
use clap::{Parser, Subcommand};
use commands::{AskCommand, ClassifyCommand, CorpusCommand};
use std::path::PathBuf;

/// agro - evidence-qualified answers from agricultural documents
#[derive(Parser, Debug)]
#[command(name = "agro")]
#[command(about = "Evidence-qualified answers from agricultural documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "AGRO_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "AGRO_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus to operate on
    #[arg(long, global = true, env = "AGRO_CORPUS")]
    corpus: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the corpus
    Ask(AskCommand),

    /// Show how a question would be routed
    Classify(ClassifyCommand),

    /// Corpus management (chunk, index, stats, clean)
    Corpus(CorpusCommand),
}

impl Cli {
    /// Environment, then config file, then flags.
    ///
    /// A workspace or config file given on the command line changes which
    /// file is read, so the file is merged again before the flags apply.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load()?;

        if self.workspace.is_some() || self.config.is_some() {
            config = config
                .with_overrides(
                    self.workspace.clone(),
                    self.config.clone(),
                    None,
                    None,
                    false,
                    false,
                )
                .merge_config_file()?;
        }

        let config = config.with_overrides(
            self.workspace.clone(),
            self.config.clone(),
            self.corpus.clone(),
            self.log_level.clone(),
            self.verbose,
            self.no_color,
        );
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("agro CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Corpus: {}", config.corpus);
    tracing::debug!(
        "Reranker: {}, reader: {}",
        config.models.reranker.provider_name(),
        config.models.reader.provider_name()
    );

    config.ensure_agro_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Classify(_) => "classify",
        Commands::Corpus(_) => "corpus",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match &cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Classify(cmd) => cmd.execute(&config),
        Commands::Corpus(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
