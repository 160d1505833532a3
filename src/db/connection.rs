use std::path::Path;
use std::time::Duration;

use deadpool_postgres::{Pool, PoolConfig, Runtime};
use postgres_native_tls::MakeTlsConnector;
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

use super::CatalogError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Password is supplied at runtime, never serialized
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default)]
    pub ssl_mode: SslMode,
    #[serde(default)]
    pub pool: PoolSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    #[default]
    Prefer,
    Require,
    Disable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    pub max_size: usize,
    pub wait_timeout_ms: u64,
    pub create_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 4,
            wait_timeout_ms: 5_000,
            create_timeout_ms: 5_000,
        }
    }
}

fn default_port() -> u16 {
    5432
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConnectionConfig {
    pub fn new(host: &str, port: u16, database: &str, user: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            database: database.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            ssl_mode: SslMode::default(),
            pool: PoolSettings::default(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn pool_config(&self) -> deadpool_postgres::Config {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.database.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.ssl_mode = Some(match self.ssl_mode {
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
        });

        let mut pool = PoolConfig::new(self.pool.max_size);
        pool.timeouts.wait = Some(Duration::from_millis(self.pool.wait_timeout_ms));
        pool.timeouts.create = Some(Duration::from_millis(self.pool.create_timeout_ms));
        cfg.pool = Some(pool);
        cfg
    }

    /// Build a connection pool. No connection is opened until first use.
    pub fn create_pool(&self) -> Result<Pool, CatalogError> {
        let cfg = self.pool_config();
        let pool = match self.ssl_mode {
            SslMode::Disable => cfg.create_pool(Some(Runtime::Tokio1), NoTls)?,
            SslMode::Prefer | SslMode::Require => {
                let connector = native_tls::TlsConnector::builder().build()?;
                cfg.create_pool(Some(Runtime::Tokio1), MakeTlsConnector::new(connector))?
            }
        };
        Ok(pool)
    }
}
