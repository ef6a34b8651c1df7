//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Bare deployment variables (`DATABASE_URL`, `DB_STRING`, `PORT`)
//! 2. Environment variables (prefixed with FLAGPOST_)
//! 3. Config file (config.toml)
//! 4. Default values
//!
//! The database connection string should be kept in the environment, not in
//! the config file.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (should be in env var DATABASE_URL)
    pub url: String,
    /// Upper bound of the connection pool
    pub max_connections: u32,
    /// Log every statement sqlx executes
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            sqlx_logging: false,
        }
    }
}

/// Page sizes used when the client does not ask for one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// JSON API default `limit`
    pub default_limit: u64,
    /// Rows per page in the admin UI tables
    pub web_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            web_limit: 25,
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie signing key, at least 64 bytes (should be in env var FLAGPOST_SESSION__SECRET_KEY)
    pub secret_key: String,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., FLAGPOST_SERVER__PORT, FLAGPOST_DATABASE__URL
            .add_source(
                Environment::with_prefix("FLAGPOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.apply_deployment_env();
        Ok(app_config)
    }

    /// Deployments set the connection string and port without a prefix.
    fn apply_deployment_env(&mut self) {
        if let Some(url) = ["DATABASE_URL", "DB_STRING"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        {
            self.database.url = url;
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring invalid PORT {:?}: {}", port, e),
            }
        }
    }

    /// Returns the configured connection string, or an error naming what is missing.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        if self.database.url.is_empty() {
            Err(ConfigError::NotFound(
                "database.url (set DATABASE_URL)".to_string(),
            ))
        } else {
            Ok(&self.database.url)
        }
    }

    /// `host:port` pair for `HttpServer::bind`.
    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.url.is_empty());
    }

    #[test]
    #[serial]
    fn test_missing_url_is_an_error() {
        let config = AppConfig::default();
        assert!(config.database_url().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("DB_STRING");
        std::env::remove_var("PORT");

        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
port = 9000

[database]
url = "sqlite::memory:"
max_connections = 2

[pagination]
web_limit = 50
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database_url().unwrap(), "sqlite::memory:");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.pagination.web_limit, 50);
        // Defaults should still apply for unspecified values
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    #[serial]
    fn test_deployment_env_overrides_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
port = 9000

[database]
url = "sqlite::memory:"
"#
        )
        .unwrap();

        std::env::set_var("DATABASE_URL", "postgres://localhost/flags");
        std::env::set_var("PORT", "7070");
        let config = AppConfig::load_from_path(temp_file.path().to_str().unwrap()).unwrap();
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("PORT");

        assert_eq!(config.database_url().unwrap(), "postgres://localhost/flags");
        assert_eq!(config.bind_address(), ("0.0.0.0".to_string(), 7070));
    }

    #[test]
    #[serial]
    fn test_missing_config_file_uses_defaults() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("DB_STRING");
        std::env::remove_var("PORT");

        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.web_limit, 25);
    }
}
