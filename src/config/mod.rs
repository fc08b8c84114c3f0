mod r#impl;

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Application configuration, loaded once at startup from a TOML file
/// with environment variable overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cpu_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cpu_count: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub pool_size: u32,
    pub retry_count: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shortspace.db?mode=rwc".to_string(),
            pool_size: 10,
            retry_count: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// "plain" or "json"
    pub format: String,
    pub enable_rotation: bool,
    pub max_backups: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "plain".to_string(),
            enable_rotation: true,
            max_backups: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Seconds between background click flushes
    pub flush_interval_secs: u64,
    /// Buffered clicks that trigger an early flush
    pub flush_threshold: usize,
    pub enable_geo_lookup: bool,
    /// Path to a MaxMind GeoLite2-City database
    pub maxminddb_path: Option<String>,
    /// Seconds between expiry sweeps over ACTIVE links
    pub expiry_sweep_interval_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 5,
            flush_threshold: 500,
            enable_geo_lookup: false,
            maxminddb_path: None,
            expiry_sweep_interval_secs: 300,
        }
    }
}

/// Initialize the global configuration. Safe to call more than once;
/// the first call wins.
pub fn init_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

/// Access the global configuration, loading it on first use.
pub fn get_config() -> &'static AppConfig {
    init_config()
}
