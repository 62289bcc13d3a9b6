//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `NEXUS_*` environment variable overrides.

use crate::fetch::{FallbackPolicy, FetchPolicy, PriceServiceConfig};
use crate::notifications::{ListenerConfig, DEFAULT_FEED_URL};
use crate::prefs::Preferences;
use crate::scheduler::RefreshIntervals;
use crate::state::DEFAULT_CITIES;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub crypto: CryptoConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub news: NewsConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Polling periods
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_weather_interval")]
    pub weather_interval_secs: u64,

    #[serde(default = "default_crypto_interval")]
    pub crypto_interval_secs: u64,

    #[serde(default = "default_news_interval")]
    pub news_interval_secs: u64,

    #[serde(default = "default_city_delay")]
    pub city_delay_ms: u64,
}

fn default_weather_interval() -> u64 {
    60
}

fn default_crypto_interval() -> u64 {
    60
}

fn default_news_interval() -> u64 {
    120
}

fn default_city_delay() -> u64 {
    300
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            weather_interval_secs: default_weather_interval(),
            crypto_interval_secs: default_crypto_interval(),
            news_interval_secs: default_news_interval(),
            city_delay_ms: default_city_delay(),
        }
    }
}

/// Price service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoConfig {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_tracked")]
    pub tracked: usize,

    #[serde(default)]
    pub fallback: FallbackPolicy,
}

fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_per_page() -> u32 {
    10
}

fn default_tracked() -> usize {
    3
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            base_url: default_coingecko_url(),
            request_timeout_ms: default_request_timeout(),
            per_page: default_per_page(),
            tracked: default_tracked(),
            fallback: FallbackPolicy::Synthesize,
        }
    }
}

/// Weather configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,

    #[serde(default)]
    pub fallback: FallbackPolicy,
}

fn default_cities() -> Vec<String> {
    DEFAULT_CITIES.iter().map(|c| c.to_string()).collect()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            fallback: FallbackPolicy::Synthesize,
        }
    }
}

/// News configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_delay")]
    pub simulated_delay_ms: u64,

    #[serde(default)]
    pub fallback: FallbackPolicy,
}

fn default_news_delay() -> u64 {
    1000
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            simulated_delay_ms: default_news_delay(),
            fallback: FallbackPolicy::Synthesize,
        }
    }
}

/// Notification listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,

    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    #[serde(default = "default_alert_probability")]
    pub price_alert_probability: f64,

    #[serde(default = "default_alert_probability")]
    pub weather_alert_probability: f64,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_alert_probability() -> f64 {
    0.3
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
            feed_url: default_feed_url(),
            price_alert_probability: default_alert_probability(),
            weather_alert_probability: default_alert_probability(),
        }
    }
}

/// Preference storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,

    /// Keep favorites in memory only
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_preferences_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("nexus").join("preferences.json").to_string_lossy().to_string())
        .unwrap_or_else(|| "./nexus_data/preferences.json".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: default_preferences_path(),
            ephemeral: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("nexus").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `NEXUS_*` overrides from any key lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("NEXUS_PREFERENCES_PATH") {
            self.storage.preferences_path = path;
        }
        if let Some(url) = lookup("NEXUS_COINGECKO_URL") {
            self.crypto.base_url = url;
        }
        if let Some(cities) = lookup("NEXUS_CITIES") {
            let cities: Vec<String> = cities
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if !cities.is_empty() {
                self.weather.cities = cities;
            }
        }
        if let Some(url) = lookup("NEXUS_FEED_URL") {
            self.notifications.feed_url = url;
        }
        if let Some(enabled) = lookup("NEXUS_NOTIFICATIONS_ENABLED") {
            if let Ok(enabled) = enabled.parse() {
                self.notifications.enabled = enabled;
            }
        }
        if let Some(level) = lookup("NEXUS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("NEXUS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn refresh_intervals(&self) -> RefreshIntervals {
        RefreshIntervals {
            weather: Duration::from_secs(self.refresh.weather_interval_secs),
            crypto: Duration::from_secs(self.refresh.crypto_interval_secs),
            news: Duration::from_secs(self.refresh.news_interval_secs),
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            crypto: self.crypto.fallback,
            weather: self.weather.fallback,
            news: self.news.fallback,
            city_delay: Duration::from_millis(self.refresh.city_delay_ms),
        }
    }

    pub fn price_service(&self) -> PriceServiceConfig {
        PriceServiceConfig {
            base_url: self.crypto.base_url.clone(),
            request_timeout_ms: self.crypto.request_timeout_ms,
            per_page: self.crypto.per_page,
            tracked: self.crypto.tracked,
        }
    }

    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            feed_enabled: self.notifications.enabled,
            feed_url: self.notifications.feed_url.clone(),
            price_alert_probability: self.notifications.price_alert_probability,
            weather_alert_probability: self.notifications.weather_alert_probability,
            weather_period: None,
        }
    }

    /// Preference store described by `[storage]`
    pub fn preferences(&self) -> Preferences {
        if self.storage.ephemeral {
            Preferences::unavailable()
        } else {
            Preferences::file(&self.storage.preferences_path)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Nexus Configuration
#
# Environment variables override these settings:
# - NEXUS_PREFERENCES_PATH
# - NEXUS_COINGECKO_URL
# - NEXUS_CITIES (comma-separated)
# - NEXUS_FEED_URL
# - NEXUS_NOTIFICATIONS_ENABLED
# - NEXUS_LOG_LEVEL
# - NEXUS_LOG_FORMAT

[refresh]
# Polling periods (seconds)
weather_interval_secs = 60
crypto_interval_secs = 60
news_interval_secs = 120

# Pause between cities during a weather refresh (ms)
city_delay_ms = 300

[crypto]
# Price service base URL
base_url = "https://api.coingecko.com/api/v3"

# Request timeout (ms)
request_timeout_ms = 5000

# Coins fetched per market list, and how many become the tracked list
per_page = 10
tracked = 3

# On failure: "synthesize" fallback data or "surface" the error
fallback = "synthesize"

[weather]
cities = ["New York", "London", "Tokyo"]
fallback = "synthesize"

[news]
# Artificial latency of the simulated feed (ms)
simulated_delay_ms = 1000
fallback = "synthesize"

[notifications]
# Connect to the live price feed
enabled = true
feed_url = "wss://ws.coincap.io/prices?assets=bitcoin,ethereum"

# Chance that a price tick or weather timer tick raises an alert
price_alert_probability = 0.3
weather_alert_probability = 0.3

[storage]
# Favorites file; defaults to the platform data directory
# preferences_path = "~/.local/share/nexus/preferences.json"

# Keep favorites in memory only
ephemeral = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
