//! Config file and environment handling.
//!
//! Resolution order: built-in defaults, then `config.toml` in the Parley
//! home, then environment variables, then command-line flags (applied by the
//! binary). Relative paths in the file are resolved against the file's
//! directory.

use crate::{ParleyConfig, ParleyError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// On-disk configuration, every key optional
#[derive(Debug, Default, Deserialize)]
pub struct ConfigToml {
    pub memory_file: Option<PathBuf>,
    pub max_memory_size: Option<usize>,
    pub knowledge_file: Option<PathBuf>,
    pub strict_clue_matching: Option<bool>,
    pub typing_delay_ms: Option<u64>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub gateway: GatewayToml,
}

/// `[gateway]` table
#[derive(Debug, Default, Deserialize)]
pub struct GatewayToml {
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub wikipedia_language: Option<String>,
    pub news_country: Option<String>,
}

impl ConfigToml {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// `Ok(None)` when the file does not exist
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).await?;
        info!("Loaded config from {:?}", path);
        Self::from_toml_str(&content).map(Some)
    }

    /// Overlay the file's settings onto `config`
    pub fn apply(self, mut config: ParleyConfig, base_dir: &Path) -> ParleyConfig {
        if let Some(path) = self.memory_file {
            config.memory_file = resolve(base_dir, path);
        }
        if let Some(size) = self.max_memory_size {
            config.max_memory_size = size;
        }
        if let Some(path) = self.knowledge_file {
            config.knowledge_file = Some(resolve(base_dir, path));
        }
        if let Some(strict) = self.strict_clue_matching {
            config.strict_clue_matching = strict;
        }
        if let Some(ms) = self.typing_delay_ms {
            config.typing_delay = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        let gateway = self.gateway;
        if gateway.weather_api_key.is_some() {
            config.gateway.weather_api_key = gateway.weather_api_key;
        }
        if gateway.news_api_key.is_some() {
            config.gateway.news_api_key = gateway.news_api_key;
        }
        if let Some(secs) = gateway.timeout_secs {
            config.gateway.timeout = Duration::from_secs(secs);
        }
        if let Some(language) = gateway.wikipedia_language {
            config.gateway.wikipedia_language = language;
        }
        if let Some(country) = gateway.news_country {
            config.gateway.news_country = country;
        }
        config
    }
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

/// API keys from the environment override the config file
pub fn apply_env<F>(mut config: ParleyConfig, lookup: F) -> ParleyConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("OPENWEATHER_API_KEY").filter(|k| !k.is_empty()) {
        config.gateway.weather_api_key = Some(key);
    }
    if let Some(key) = lookup("NEWS_API_KEY").filter(|k| !k.is_empty()) {
        config.gateway.news_api_key = Some(key);
    }
    config
}

/// `$PARLEY_HOME`, or `~/.parley`
pub fn parley_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("PARLEY_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| ParleyError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".parley"))
}

/// Build the configuration from defaults, an optional config file and the environment
pub async fn load_config(parley_home: &Path, config_file: Option<&Path>) -> Result<ParleyConfig> {
    let config_path = config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| parley_home.join(CONFIG_FILE_NAME));
    let mut config = ParleyConfig::new(parley_home.to_path_buf());

    match ConfigToml::load(&config_path).await? {
        Some(file) => {
            let base_dir = config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| parley_home.to_path_buf());
            config = file.apply(config, &base_dir);
        }
        None if config_file.is_some() => {
            return Err(ParleyError::Config(format!(
                "config file {:?} does not exist",
                config_path
            )));
        }
        None => {}
    }

    Ok(apply_env(config, |name| std::env::var(name).ok()))
}
