use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StocktalkConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub pipeline: PipelineConfig,
    pub cache: CacheConfig,
    pub visualization: VisualizationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the data backend, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    pub search_path: String,
    pub chat_path: String,
    pub schema_path: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trailing window injected when a query needs a date range but names none.
    pub default_date_range_days: i64,
    pub max_search_results: usize,
    /// Free text appended to the system prompt sent to the model backend.
    pub custom_prompt_addition: String,
    pub detailed_logging: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub search_ttl_secs: u64,
    pub schema_ttl_secs: u64,
    /// Freshness-sensitive tool results (live inventory levels).
    pub fresh_ttl_secs: u64,
    /// Near-static tool results (product catalogs).
    pub catalog_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Chart type used when auto-selection finds no better signal.
    pub default_chart_type: String,
    /// Record count above which pie charts degrade to bar charts.
    pub max_pie_slices: usize,
}

impl Default for StocktalkConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            pipeline: PipelineConfig::default(),
            cache: CacheConfig::default(),
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8750,
            log_level: "info".into(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".into(),
            search_path: "/search".into(),
            chat_path: "/chat".into(),
            schema_path: "/schema".into(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_date_range_days: 30,
            max_search_results: 5,
            custom_prompt_addition: String::new(),
            detailed_logging: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            search_ttl_secs: 600,
            schema_ttl_secs: 1800,
            fresh_ttl_secs: 90,
            catalog_ttl_secs: 900,
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            default_chart_type: "bar".into(),
            max_pie_slices: 8,
        }
    }
}

/// Returns `~/.stocktalk/`
pub fn default_stocktalk_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".stocktalk")
}

/// Returns the default config file path: `~/.stocktalk/config.toml`
pub fn default_config_path() -> PathBuf {
    default_stocktalk_dir().join("config.toml")
}

impl StocktalkConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            StocktalkConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (STOCKTALK_BACKEND_URL,
    /// STOCKTALK_LOG_LEVEL, STOCKTALK_DATE_RANGE_DAYS).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STOCKTALK_BACKEND_URL") {
            self.backend.base_url = val;
        }
        if let Ok(val) = std::env::var("STOCKTALK_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("STOCKTALK_DATE_RANGE_DAYS") {
            if let Ok(days) = val.parse() {
                self.pipeline.default_date_range_days = days;
            }
        }
    }
}

/// Shared, observable configuration.
///
/// Settings changes propagate through a `tokio::sync::watch` channel.
/// The pipeline reads a fresh snapshot per request via
/// [`current`](ConfigHandle::current); long-lived components that need to
/// react to changes hold a [`subscribe`](ConfigHandle::subscribe) receiver.
#[derive(Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<StocktalkConfig>>,
}

impl ConfigHandle {
    pub fn new(config: StocktalkConfig) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> StocktalkConfig {
        self.tx.borrow().clone()
    }

    /// Publish a new configuration to all subscribers.
    pub fn update(&self, config: StocktalkConfig) {
        self.tx.send_replace(config);
    }

    /// Receiver that observes every published configuration.
    pub fn subscribe(&self) -> watch::Receiver<StocktalkConfig> {
        self.tx.subscribe()
    }
}
