//! # API Configuration
//!
//! Configuration management for the HTTP server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     WARD_PORT=8080                                                     │
//! │     WARD_JWT_SECRET=...                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path> or WARD_CONFIG                                     │
//! │     else ~/.config/ward/ward.toml (Linux)                              │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/ward/ward.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//! busy_timeout_secs = 5
//!
//! [auth]
//! jwt_secret = "change-me"
//! token_lifetime_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use ward_db::DbConfig;

/// Secret used when nothing else is configured. `main` warns when it is in use.
const DEV_JWT_SECRET: &str = "ward-dev-secret-change-in-production";

// =============================================================================
// Sections
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a request waits for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long SQLite waits on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("ward.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Lifetime of tokens minted by `ward-api issue-token`.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_lifetime() -> i64 {
    3600
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `WARD_CONFIG`, or the platform default)
    /// 3. Environment variables
    ///
    /// An explicitly named file must exist; the platform default may not.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.or_else(|| std::env::var_os("WARD_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".into()));
        }

        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.token_lifetime_secs must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database.path".into()));
        }

        Ok(())
    }

    /// Applies `WARD_*` overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("WARD_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("WARD_PORT") {
            self.server.port = parse_env("WARD_PORT", &port)?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(path) = lookup("WARD_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("WARD_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("WARD_MAX_CONNECTIONS", &max)?;
        }

        if let Some(secret) = lookup("WARD_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(lifetime) = lookup("WARD_JWT_LIFETIME_SECS") {
            self.auth.token_lifetime_secs = parse_env("WARD_JWT_LIFETIME_SECS", &lifetime)?;
        }

        Ok(())
    }

    /// Pool settings for [`ward_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        let config = if self.database.path == std::path::Path::new(ward_db::pool::MEMORY_PATH) {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
        };

        config
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }

    /// True while the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "ward", "ward")
            .map(|dirs| dirs.config_dir().join("ward.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, raw)))
}

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.uses_dev_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.auth.token_lifetime_secs, 3600);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ApiConfig::default();
        config
            .apply_env_overrides(env(&[
                ("WARD_PORT", "9999"),
                ("WARD_DATABASE_PATH", ":memory:"),
                ("WARD_JWT_SECRET", "from-env"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert!(config.db_config().is_in_memory());
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_env_overrides(env(&[("WARD_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ApiConfig::default();

        config.auth.jwt_secret = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        config.auth.jwt_secret = "ok".into();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ApiConfig::default()).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[auth]"));
    }
}
