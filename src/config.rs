//! Application configuration module
//!
//! Settings are built once at startup and handed to the components that need
//! them. Sources, lowest precedence first:
//! - an optional settings file (`SPROUT_CONFIG`, default `sprout.toml`),
//!   optionally narrowed to one environment section (`SPROUT_ENV`)
//! - environment variables (`.env` is loaded first)

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "sprout.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// Database server configuration.
///
/// `database` is the maintenance database used for `CREATE DATABASE`;
/// application databases are reached by swapping in the application name.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_pool_size: usize,
    pub require_tls: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            max_pool_size: 4,
            require_tls: false,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Policy knobs for the drift engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiffPolicy {
    /// Leave a model's primary keys out of both sides of the diff.
    pub exclude_identity: bool,
    /// Identity column excluded instead when a model declares no primary key.
    pub identity_column: String,
    /// Fail the diff when the catalog query errors instead of diffing
    /// against an empty snapshot.
    pub strict_catalog: bool,
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self {
            exclude_identity: false,
            identity_column: "id".to_string(),
            strict_catalog: false,
        }
    }
}

/// Shape of the settings file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    server: ServerConfig,
    database: DatabaseConfig,
    cors: CorsConfig,
    diff: DiffPolicy,
    models_path: Option<String>,
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub diff: DiffPolicy,
    /// JSON file with additional model definitions
    pub models_path: Option<String>,
}

impl Settings {
    /// Load settings from the settings file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let path = std::env::var("SPROUT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let section = std::env::var("SPROUT_ENV").ok();

        let source = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .build()?;

        let mut settings = Self::from_source(&source, section.as_deref())?;
        settings.apply_env()?;
        Ok(settings)
    }

    /// Build settings from an already-assembled source, optionally reading
    /// only the named environment section (e.g. `[production]`).
    fn from_source(source: &config::Config, section: Option<&str>) -> Result<Self, ConfigError> {
        let file: FileSettings = match section {
            Some(name) => source.get(name)?,
            None => source.clone().try_deserialize()?,
        };

        Ok(Self {
            server: file.server,
            database: file.database,
            cors: file.cors,
            diff: file.diff,
            models_path: file.models_path,
        })
    }

    /// Environment variables override anything read from the file
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_parse("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("PORT") {
            self.server.port = port;
        }

        // DATABASE_URL wins over the individual variables
        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            let max_pool_size = self.database.max_pool_size;
            self.database = Self::parse_database_url(&database_url)?;
            self.database.max_pool_size = max_pool_size;
        } else {
            if let Ok(host) = std::env::var("DB_HOST") {
                self.database.host = host;
            }
            if let Some(port) = env_parse("DB_PORT") {
                self.database.port = port;
            }
            if let Ok(user) = std::env::var("DB_USER") {
                self.database.user = user;
            }
            if let Ok(password) = std::env::var("DB_PASSWORD") {
                self.database.password = password;
            }
            if let Ok(name) = std::env::var("DB_NAME") {
                self.database.database = name;
            }
        }
        if let Some(size) = env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_pool_size = size;
        }

        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Some(flag) = env_parse("SPROUT_EXCLUDE_IDENTITY") {
            self.diff.exclude_identity = flag;
        }
        if let Some(flag) = env_parse("SPROUT_STRICT_CATALOG") {
            self.diff.strict_catalog = flag;
        }
        if let Ok(path) = std::env::var("MODELS_PATH") {
            self.models_path = Some(path);
        }

        Ok(())
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    fn parse_database_url(url: &str) -> Result<DatabaseConfig, ConfigError> {
        let parsed = url::Url::parse(url).map_err(|_| {
            ConfigError::InvalidValue("Invalid DATABASE_URL format (expected postgresql://...)".to_string())
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported DATABASE_URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?
            .to_string();

        let database = match parsed.path().trim_start_matches('/') {
            "" => DatabaseConfig::default().database,
            name => name.to_string(),
        };

        let require_tls = parsed
            .query_pairs()
            .any(|(k, v)| k == "sslmode" && v == "require");

        Ok(DatabaseConfig {
            host,
            port: parsed.port().unwrap_or(5432),
            user: parsed.username().to_string(),
            password: parsed.password().map(|p| p.to_string()).unwrap_or_default(),
            database,
            max_pool_size: DatabaseConfig::default().max_pool_size,
            require_tls,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
