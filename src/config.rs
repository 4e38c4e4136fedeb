//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::orders::storefronts::Storefront;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storefront whose order history is fetched
    #[serde(default)]
    pub storefront: Storefront,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base politeness delay before each page request in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to the politeness delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Delay after a page loads before extraction, giving client-side
    /// rendered order summaries time to settle
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Orders shown per listing page; a shorter page is the last one
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard ceiling on pages fetched per range
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Attempts to open an order-history page before giving up
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Base backoff between page-open attempts, doubled per retry
    #[serde(default = "default_fetch_backoff_ms")]
    pub fetch_backoff_ms: u64,

    /// How long a cached range aggregate stays fresh
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Cache file location; defaults to the user cache directory
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_page_size() -> u32 {
    10
}

fn default_max_pages() -> u32 {
    20
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_fetch_backoff_ms() -> u64 {
    500
}

fn default_cache_ttl_ms() -> u64 {
    24 * 60 * 60 * 1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storefront: Storefront::Us,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            settle_ms: default_settle_ms(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            fetch_attempts: default_fetch_attempts(),
            fetch_backoff_ms: default_fetch_backoff_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            cache_path: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-spending").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(storefront) = std::env::var("AMZ_STOREFRONT") {
            if let Ok(s) = storefront.parse() {
                self.storefront = s;
            }
        }

        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("AMZ_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(ttl) = std::env::var("AMZ_CACHE_TTL_MS") {
            if let Ok(t) = ttl.parse() {
                self.cache_ttl_ms = t;
            }
        }

        self
    }

    /// Resolves the cache file path, falling back to the user cache dir.
    pub fn resolved_cache_path(&self) -> PathBuf {
        if let Some(path) = &self.cache_path {
            return path.clone();
        }

        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("amz-spending")
            .join("cache.json")
    }
}
