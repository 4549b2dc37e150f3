use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::breaker::BreakerConfig;
use crate::core::cache::FeedConfig;
use crate::core::session::SessionConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub resilience: ResilienceSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Matching-service endpoint settings. The auth token is supplied by the
/// session-management collaborator, usually via `LUME_API__AUTH_TOKEN`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    #[serde(default = "default_decline_delay")]
    pub decline_delay_secs: u64,
    #[serde(default = "default_preload_batch")]
    pub preload_batch: u16,
    #[serde(default = "default_preload_low_water")]
    pub preload_low_water: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_endpoint() -> String {
    "https://api.lume.app".to_string()
}
fn default_fetch_timeout() -> u64 {
    15
}
fn default_page_size() -> u16 {
    10
}
fn default_failure_threshold() -> u32 {
    3
}
fn default_cooldown() -> u64 {
    30
}
fn default_decline_delay() -> u64 {
    180
}
fn default_preload_batch() -> u16 {
    3
}
fn default_preload_low_water() -> usize {
    3
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auth_token: None,
            fetch_timeout_secs: default_fetch_timeout(),
            default_page_size: default_page_size(),
        }
    }
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            decline_delay_secs: default_decline_delay(),
            preload_batch: default_preload_batch(),
            preload_low_water: default_preload_low_water(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with LUME_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with LUME_)
            // e.g., LUME_API__ENDPOINT -> api.endpoint
            .add_source(
                Environment::with_prefix("LUME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LUME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.resilience.failure_threshold,
            cooldown: Duration::from_secs(self.resilience.cooldown_secs),
        }
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            breaker: self.breaker_config(),
            preload_batch: self.pacing.preload_batch,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            decline_delay: Duration::from_secs(self.pacing.decline_delay_secs),
            preload_low_water: self.pacing.preload_low_water,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.api.fetch_timeout_secs)
    }
}
