//! Parley - deterministic dialogue engine
//!
//! A small assistant core that:
//! - Matches utterances against an ordered pattern/response knowledge base
//! - Remembers recent interactions and what the user said about themselves
//! - Routes commands to an external knowledge gateway (weather, wikipedia, news)
//! - Falls back to sentiment-toned replies when nothing matches

pub mod commands;
pub mod config;
pub mod gateway;
pub mod knowledge;
pub mod matcher;
pub mod memory;
pub mod repl;
pub mod selector;
pub mod sentiment;

pub use commands::Command;
pub use gateway::{GatewayService, HttpGateway, KnowledgeGateway};
pub use knowledge::{KnowledgeBase, KnowledgeEntry};
pub use matcher::IntentMatcher;
pub use memory::{
    ClueMatching, ContextClues, ContextExtractor, ConversationMemory, InMemoryStore,
    Interaction, JsonFileStore, MemorySnapshot, MemoryStore, UserContext,
};
pub use selector::ResponseSelector;
pub use sentiment::{normalize_score, FixedScorer, LexiconScorer, SentimentScorer};

use std::path::PathBuf;
use std::time::Duration;

/// Default number of interactions kept in memory
pub const DEFAULT_MAX_MEMORY_SIZE: usize = 100;

/// Default timeout for a single gateway call
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for Parley
#[derive(Debug, Clone)]
pub struct ParleyConfig {
    /// Path to the persisted conversation memory
    pub memory_file: PathBuf,

    /// Maximum number of interactions retained
    pub max_memory_size: usize,

    /// Optional TOML knowledge base replacing the built-in table
    pub knowledge_file: Option<PathBuf>,

    /// Only accept "my name is" / "i live in" at a sentence start
    pub strict_clue_matching: bool,

    /// Artificial pause before each reply in the terminal front end
    pub typing_delay: Option<Duration>,

    /// Seed for response selection (random when unset)
    pub seed: Option<u64>,

    /// Knowledge gateway settings
    pub gateway: GatewayConfig,
}

/// Settings for the HTTP knowledge gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub timeout: Duration,
    pub wikipedia_language: String,
    pub news_country: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            news_api_key: None,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
            wikipedia_language: "en".to_string(),
            news_country: "us".to_string(),
        }
    }
}

impl ParleyConfig {
    pub fn new(parley_home: PathBuf) -> Self {
        let memory_file = parley_home.join("conversation_memory.json");
        Self {
            memory_file,
            max_memory_size: DEFAULT_MAX_MEMORY_SIZE,
            knowledge_file: None,
            strict_clue_matching: false,
            typing_delay: None,
            seed: None,
            gateway: GatewayConfig::default(),
        }
    }

    pub fn with_memory_file(mut self, path: PathBuf) -> Self {
        self.memory_file = path;
        self
    }

    pub fn with_max_memory_size(mut self, size: usize) -> Self {
        self.max_memory_size = size;
        self
    }

    pub fn with_knowledge_file(mut self, path: PathBuf) -> Self {
        self.knowledge_file = Some(path);
        self
    }

    pub fn with_strict_clue_matching(mut self, strict: bool) -> Self {
        self.strict_clue_matching = strict;
        self
    }

    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = Some(delay);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clue_matching(&self) -> ClueMatching {
        if self.strict_clue_matching {
            ClueMatching::Strict
        } else {
            ClueMatching::Loose
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_size == 0 {
            return Err(ParleyError::Config(
                "max_memory_size must be at least 1".to_string(),
            ));
        }
        if self.gateway.timeout.is_zero() {
            return Err(ParleyError::Config(
                "gateway timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result type for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

/// Errors that can occur in Parley
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
