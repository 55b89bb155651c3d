//! Server configuration loaded from the environment.

use std::fmt;
use std::str::FromStr;

const DEFAULT_ORIGINS: &str = "http://127.0.0.1:4200,http://localhost:4200";

/// Backend holding ship records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL through diesel, configured by `DATABASE_URL`.
    Postgres,
    /// Process memory; contents are lost on restart.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ConfigError(format!(
                "COSMOPORT_STORE must be `postgres` or `memory`, got `{other}`"
            ))),
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Settings needed to boot the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Selected store backend.
    pub store: StoreKind,
    /// PostgreSQL connection string, required for [`StoreKind::Postgres`].
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Build the configuration from process environment variables.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("COSMOPORT_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port_raw = lookup("COSMOPORT_PORT").unwrap_or_else(|| "8080".to_string());
        let port = u16::from_str(port_raw.trim())
            .map_err(|_| ConfigError("COSMOPORT_PORT must be a u16 number".to_string()))?;
        let origins = lookup("COSMOPORT_UI_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.to_string());
        let allowed_origins = origins
            .split(',')
            .map(|value| value.trim())
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();
        let store = match lookup("COSMOPORT_STORE") {
            Some(value) => value.parse()?,
            None => StoreKind::Postgres,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError(
                "DATABASE_URL must be set to a PostgreSQL connection string".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            allowed_origins,
            store,
            database_url,
        })
    }
}
