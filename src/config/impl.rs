use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, error, warn};

use super::AppConfig;

impl AppConfig {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    /// Load configuration from TOML file
    fn load_from_file() -> Self {
        let config_paths = [
            "config.toml",
            "shortspace.toml",
            "config/config.toml",
            "/etc/shortspace/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<AppConfig>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    /// Override configuration with environment variables
    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            } else {
                error!("Invalid SERVER_PORT: {}", port);
            }
        }
        if let Ok(cpu_count) = env::var("CPU_COUNT") {
            if let Ok(count) = cpu_count.parse() {
                self.server.cpu_count = count;
            } else {
                error!("Invalid CPU_COUNT: {}", cpu_count);
            }
        }

        // Database config
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.database.database_url = database_url;
        }
        if let Ok(pool_size) = env::var("DATABASE_POOL_SIZE") {
            if let Ok(size) = pool_size.parse::<u32>() {
                self.database.pool_size = size;
            } else {
                error!("Invalid DATABASE_POOL_SIZE: {}", pool_size);
            }
        }

        // Logging config
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(file) = env::var("LOG_FILE") {
            self.logging.file = Some(file);
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        // Analytics config
        if let Ok(interval) = env::var("ANALYTICS_FLUSH_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.analytics.flush_interval_secs = secs;
            } else {
                error!("Invalid ANALYTICS_FLUSH_INTERVAL: {}", interval);
            }
        }
        if let Ok(threshold) = env::var("ANALYTICS_FLUSH_THRESHOLD") {
            if let Ok(count) = threshold.parse() {
                self.analytics.flush_threshold = count;
            } else {
                error!("Invalid ANALYTICS_FLUSH_THRESHOLD: {}", threshold);
            }
        }
        if let Ok(enabled) = env::var("ANALYTICS_ENABLE_GEO_LOOKUP") {
            self.analytics.enable_geo_lookup = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }
        if let Ok(path) = env::var("MAXMINDDB_PATH") {
            self.analytics.maxminddb_path = Some(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.retry_count, 3);
        assert_eq!(config.analytics.flush_interval_secs, 5);
        assert!(config.analytics.maxminddb_path.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [analytics]
            flush_threshold = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.analytics.flush_threshold, 64);
        // 未出现的段落保持默认
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.pool_size, 10);
    }
}
