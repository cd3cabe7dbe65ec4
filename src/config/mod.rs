//! Configuration management for vodseek
//!
//! Settings come from a TOML file, optionally narrowed by a named profile and
//! overridden by `VODSEEK_<SECTION>__<KEY>` environment variables.

use crate::error::{Result, VodseekError};
use crate::retrieval::Backoff;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Supported `_meta.schema_version`
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub history: HistoryConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub search_path: String,
    /// Request timeout, e.g. `"10s"`
    pub timeout: String,
    /// Videos requested per page (backend maximum is 100)
    pub page_size: usize,
    /// Let the backend answer from its own cache
    pub use_server_cache: bool,
}

/// Retry budgets for the main fetch and for each fallback candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: String,
    #[serde(default)]
    pub backoff: Backoff,
    pub fallback_attempts: u32,
    pub fallback_delay: String,
}

/// Client-side result cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: String,
}

/// Persisted store location and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Largest single value the store accepts, e.g. `"5MB"`
    pub max_entry_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub max_items: usize,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_server_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VodseekError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| VodseekError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VodseekError::ConfigNotFound { path }) => {
                tracing::warn!("No config file at {:?}, using defaults", path);
                let mut config = Config::default();
                config.apply_env_overrides();
                ConfigValidator::validate(&config)?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VodseekError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| VodseekError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| VodseekError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(page_size) = overrides.page_size {
            self.api.page_size = page_size;
        }
        if let Some(use_server_cache) = overrides.use_server_cache {
            self.api.use_server_cache = use_server_cache;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }

        ConfigValidator::validate(self)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: VODSEEK_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `VODSEEK_`-prefixed overrides from any key/value source
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("VODSEEK_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "API__BASE_URL" => self.api.base_url = value.to_string(),
            "API__SEARCH_PATH" => self.api.search_path = value.to_string(),
            "API__TIMEOUT" => self.api.timeout = value.to_string(),
            "API__PAGE_SIZE" => self.api.page_size = parse_env(path, value)?,
            "API__USE_SERVER_CACHE" => self.api.use_server_cache = parse_env(path, value)?,
            "RETRY__MAX_ATTEMPTS" => self.retry.max_attempts = parse_env(path, value)?,
            "RETRY__BASE_DELAY" => self.retry.base_delay = value.to_string(),
            "RETRY__BACKOFF" => {
                self.retry.backoff =
                    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
                        .map_err(|_| VodseekError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Unknown backoff '{}'", value),
                        })?;
            }
            "RETRY__FALLBACK_ATTEMPTS" => self.retry.fallback_attempts = parse_env(path, value)?,
            "RETRY__FALLBACK_DELAY" => self.retry.fallback_delay = value.to_string(),
            "CACHE__ENABLED" => self.cache.enabled = parse_env(path, value)?,
            "CACHE__TTL" => self.cache.ttl = value.to_string(),
            "STORAGE__DATA_DIR" => self.storage.data_dir = PathBuf::from(value),
            "STORAGE__MAX_ENTRY_SIZE" => self.storage.max_entry_size = value.to_string(),
            "HISTORY__MAX_ITEMS" => self.history.max_items = parse_env(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VodseekError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("vodseek").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| VodseekError::Config("Cannot determine data directory".to_string()))?;

        Ok(data_dir.join("vodseek"))
    }

    /// Request timeout as a [`std::time::Duration`]
    pub fn request_timeout(&self) -> std::time::Duration {
        crate::duration::to_std(&self.api.timeout).unwrap_or(std::time::Duration::from_secs(10))
    }

    /// Cache entry lifetime as a [`std::time::Duration`]
    pub fn cache_ttl(&self) -> std::time::Duration {
        crate::duration::to_std(&self.cache.ttl).unwrap_or(crate::storage::DEFAULT_TTL)
    }

    /// `storage.max_entry_size` in bytes
    pub fn max_entry_bytes(&self) -> u64 {
        crate::storage::parse_size(&self.storage.max_entry_size).unwrap_or(5 * 1024 * 1024)
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VodseekError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::default_data_dir().unwrap_or_else(|_| PathBuf::from(".vodseek"));

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                search_path: "/api/search/".to_string(),
                timeout: "10s".to_string(),
                page_size: 24,
                use_server_cache: true,
            },
            retry: RetryConfig {
                max_attempts: 3,
                base_delay: "1s".to_string(),
                backoff: Backoff::Constant,
                fallback_attempts: 2,
                fallback_delay: "1s".to_string(),
            },
            cache: CacheConfig {
                enabled: true,
                ttl: "15m".to_string(),
            },
            storage: StorageConfig {
                data_dir,
                max_entry_size: "5MB".to_string(),
            },
            history: HistoryConfig { max_items: 10 },
            profiles: HashMap::new(),
        }
    }
}
