//! TOML configuration for the catalog bot.
//!
//! Everything that is safe to commit lives in the config file. Secrets (the
//! bot token and the TMDB API key) are read from the environment by the
//! commands that need them, see [`bot_token`] and [`tmdb_api_key`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// The single user allowed to run admin commands.
    pub admin_id: i64,
    /// Chat where uploaded files are picked up for indexing.
    pub database_group_id: i64,
    /// Channel where new titles are announced.
    pub official_channel_id: i64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_poll_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_base")]
    pub base_url: String,
    #[serde(default = "default_image_base")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tmdb_base(),
            image_base_url: default_image_base(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_tmdb_base() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_image_base() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}
fn default_language() -> String {
    "es-ES".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            session_ttl_secs: default_session_ttl(),
            search_result_limit: default_search_result_limit(),
        }
    }
}

fn default_max_candidates() -> usize {
    3
}
fn default_session_ttl() -> u64 {
    24 * 60 * 60
}
fn default_search_result_limit() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.indexing.max_candidates == 0 {
        anyhow::bail!("indexing.max_candidates must be >= 1");
    }

    if config.indexing.search_result_limit == 0 {
        anyhow::bail!("indexing.search_result_limit must be >= 1");
    }

    if config.indexing.session_ttl_secs == 0 {
        anyhow::bail!("indexing.session_ttl_secs must be >= 1");
    }

    // Telegram rejects long-poll timeouts above 50 seconds.
    if config.telegram.poll_timeout_secs > 50 {
        anyhow::bail!("telegram.poll_timeout_secs must be <= 50");
    }

    if config.tmdb.language.trim().is_empty() {
        anyhow::bail!("tmdb.language must not be empty");
    }

    Ok(config)
}

/// Bot API token from `BOT_TOKEN`.
pub fn bot_token() -> Result<String> {
    std::env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN environment variable not set"))
}

/// TMDB API key from `TMDB_API_KEY`.
pub fn tmdb_api_key() -> Result<String> {
    std::env::var("TMDB_API_KEY")
        .map_err(|_| anyhow::anyhow!("TMDB_API_KEY environment variable not set"))
}
