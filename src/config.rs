use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::core::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};
use crate::core::list::{DEFAULT_ITEMS_PER_PAGE, DEFAULT_TOTAL};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheSection,
    pub data: DataConfig,
}

/// Remote data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Page size for the incremental list loader.
    pub items_per_page: usize,
    /// Known size of the loaded universe.
    pub total: usize,
    /// Locale for descriptive species text.
    pub locale: String,
}

/// Cache tier configuration, shared by both tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Time-to-live in seconds.
    pub ttl_secs: u64,
    /// In-memory tier capacity.
    pub capacity: usize,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            total: DEFAULT_TOTAL,
            locale: "en".to_string(),
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_MS / 1000,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheSection {
    /// TTL converted to milliseconds, the unit the cache tiers use.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_secs * 1000
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/kantodex/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("kantodex"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("kantodex").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
