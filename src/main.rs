//! Parley CLI
//!
//! Chat with the dialogue engine on stdin/stdout. Logs go to stderr.

use clap::Parser;
use parley::config::{load_config, parley_home};
use parley::repl::run_repl;
use parley::{
    ContextExtractor, ConversationMemory, HttpGateway, IntentMatcher, JsonFileStore,
    KnowledgeBase, LexiconScorer, ParleyConfig, ResponseSelector,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parley - a small assistant with memory
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $PARLEY_HOME/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the persisted conversation memory
    #[arg(long)]
    memory_file: Option<PathBuf>,

    /// TOML knowledge base replacing the built-in one
    #[arg(long)]
    knowledge_file: Option<PathBuf>,

    /// Number of interactions to remember
    #[arg(long)]
    max_memory: Option<usize>,

    /// Seed for response selection
    #[arg(long)]
    seed: Option<u64>,

    /// Pause before each reply, in milliseconds
    #[arg(long)]
    typing_delay_ms: Option<u64>,

    /// Only accept "my name is" / "i live in" at the start of a sentence
    #[arg(long)]
    strict_clues: bool,

    /// Forget all stored interactions before starting
    #[arg(long)]
    reset_memory: bool,

    /// Verbose output: debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Answer a single utterance and exit
    #[arg(trailing_var_arg = true)]
    utterance: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let home = parley_home()?;
    let config = apply_cli(load_config(&home, cli.config.as_deref()).await?, &cli);
    config.validate()?;

    info!("Starting Parley");
    info!("Memory file: {:?}", config.memory_file);

    let mut selector = build_selector(&config).await?;
    if cli.reset_memory {
        selector.reset_memory().await?;
    }

    if !cli.utterance.is_empty() {
        let response = selector.handle_turn(&cli.utterance.join(" ")).await;
        writeln!(io::stdout(), "{}", response)?;
        return Ok(());
    }

    run_repl(
        &mut selector,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        config.typing_delay,
    )
    .await?;

    Ok(())
}

/// Command-line flags take precedence over file and environment
fn apply_cli(mut config: ParleyConfig, cli: &Cli) -> ParleyConfig {
    if let Some(path) = &cli.memory_file {
        config = config.with_memory_file(path.clone());
    }
    if let Some(path) = &cli.knowledge_file {
        config = config.with_knowledge_file(path.clone());
    }
    if let Some(size) = cli.max_memory {
        config = config.with_max_memory_size(size);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(ms) = cli.typing_delay_ms {
        config.typing_delay = (ms > 0).then(|| Duration::from_millis(ms));
    }
    if cli.strict_clues {
        config = config.with_strict_clue_matching(true);
    }
    config
}

async fn build_selector(config: &ParleyConfig) -> anyhow::Result<ResponseSelector> {
    let knowledge = match &config.knowledge_file {
        Some(path) => {
            info!("Loading knowledge base from {:?}", path);
            KnowledgeBase::load(path).await?
        }
        None => KnowledgeBase::builtin(),
    };
    info!("Knowledge base: {} categories", knowledge.len());

    let memory = ConversationMemory::open(
        Box::new(JsonFileStore::new(config.memory_file.clone())),
        config.max_memory_size,
        ContextExtractor::new(config.clue_matching()),
    )
    .await;

    let selector = ResponseSelector::new(
        IntentMatcher::new(Arc::new(knowledge)),
        memory,
        Box::new(LexiconScorer::new()),
        Arc::new(HttpGateway::new(&config.gateway)?),
    )
    .with_gateway_timeout(config.gateway.timeout);

    Ok(match config.seed {
        Some(seed) => selector.with_seed(seed),
        None => selector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "parley",
            "--max-memory",
            "5",
            "--seed",
            "3",
            "--typing-delay-ms",
            "0",
            "--strict-clues",
        ]);
        let config = ParleyConfig::new(PathBuf::from("/tmp/parley"))
            .with_typing_delay(Duration::from_secs(1));
        let config = apply_cli(config, &cli);
        assert_eq!(config.max_memory_size, 5);
        assert_eq!(config.seed, Some(3));
        assert!(config.typing_delay.is_none());
        assert!(config.strict_clue_matching);
    }

    #[test]
    fn test_trailing_utterance() {
        let cli = Cli::parse_from(["parley", "weather", "in", "Oslo"]);
        assert_eq!(cli.utterance.join(" "), "weather in Oslo");
    }
}
