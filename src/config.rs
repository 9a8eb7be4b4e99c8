//! Application configuration with layered loading.
//!
//! Sources, highest precedence first:
//!
//! 1. Environment variables prefixed `APP_` (e.g. `APP_BIND_ADDR`)
//! 2. TOML config file named by `APP_CONFIG_FILE`, if set
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Runtime configuration for the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    ///
    /// Set via `APP_BIND_ADDR`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Redis connection URL.
    ///
    /// Set via `APP_REDIS_URL`.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// TTL in seconds for cached responses.
    ///
    /// Set via `APP_CACHE_TTL_SECS`.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8001".into()
}

fn default_redis_url() -> String {
    "redis://redis:6379".into()
}

fn default_cache_ttl_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            redis_url: default_redis_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// The cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when the TOML file cannot be read or
    /// a value fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("APP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("APP_"));

        Ok(figment.extract()?)
    }
}
