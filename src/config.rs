//! Configuration module
//!
//! `AppConfig` is read from a TOML file (every section optional), then
//! environment variables are layered on top:
//!
//! | Variable               | Field                       |
//! |------------------------|-----------------------------|
//! | `APP_HOST`             | `server.host`               |
//! | `APP_PORT`             | `server.port`               |
//! | `APP_SHUTDOWN_TIMEOUT` | `server.shutdown_timeout`   |
//! | `DB_HOST`              | `database.host`             |
//! | `DB_PORT`              | `database.port`             |
//! | `DB_USER`              | `database.user`             |
//! | `DB_PASSWORD`          | `database.password`         |
//! | `DB_NAME`              | `database.name`             |
//! | `DB_URL`               | `database.url`              |
//! | `LOG_LEVEL`            | `logging.level`             |
//! | `LOG_FORMAT`           | `logging.format`            |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::database::PoolConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Default config location: `~/.config/subscription-aggregator/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subscription-aggregator")
        .join("config.toml")
}

/// HTTP server section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds allowed for cleanup after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 10,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database section. `url`, when set, wins over the individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub url: Option<String>,
    pub pool: PoolConfig,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "subscriptions".to_string(),
            url: None,
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. `info` or `subscription_aggregator=debug`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

impl AppConfig {
    /// Reads `path`, applies environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Layers variables returned by `lookup` over the current values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("APP_PORT") {
            self.server.port = parse_env("APP_PORT", v)?;
        }
        if let Some(v) = lookup("APP_SHUTDOWN_TIMEOUT") {
            self.server.shutdown_timeout = parse_env("APP_SHUTDOWN_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse_env("DB_PORT", v)?;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.shutdown_timeout == 0 {
            return Err(ConfigError::Invalid(
                "server.shutdown_timeout must be positive".to_string(),
            ));
        }
        if self.database.pool.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.pool.max_connections must be positive".to_string(),
            ));
        }
        if self.database.pool.min_connections > self.database.pool.max_connections {
            return Err(ConfigError::Invalid(
                "database.pool.min_connections exceeds max_connections".to_string(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [database]
            name = "subs"

            [database.pool]
            max_connections = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.name, "subs");
        assert_eq!(config.database.pool.max_connections, 4);
        assert_eq!(config.database.pool.min_connections, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("APP_PORT", "3000"),
                ("APP_SHUTDOWN_TIMEOUT", "5"),
                ("DB_HOST", "db"),
                ("DB_USER", "app"),
                ("DB_PASSWORD", "secret"),
                ("DB_NAME", "billing"),
                ("LOG_FORMAT", "pretty"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.shutdown_timeout, 5);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(
            config.database.connection_url(),
            "postgres://app:secret@db:5432/billing"
        );
    }

    #[test]
    fn db_url_replaces_individual_fields() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[("DB_URL", "sqlite::memory:"), ("DB_HOST", "ignored")]))
            .unwrap();
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn unparsable_env_value_is_reported() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(env(&[("APP_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "APP_PORT", .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.server.shutdown_timeout = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.pool.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("subscription-aggregator-missing.toml");
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("subscription-aggregator/config.toml"));
    }
}
