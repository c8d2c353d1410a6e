use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Connection settings of the legacy (2.x) database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl LegacyDatabaseConfig {
    /// Build the sqlx connection URL
    ///
    /// Credentials are percent-encoded so passwords containing `@`, `:` or `/`
    /// survive URL parsing.
    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.database
        )
    }
}

/// Migrator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub legacy: LegacyDatabaseConfig,
    /// Destination (3.x) database URL
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name).with_context(|| format!("{} must be set", name))
        };

        Ok(Self {
            legacy: LegacyDatabaseConfig {
                username: required("PASTEMED_OLD_DB_USERNAME")?,
                password: required("PASTEMED_OLD_DB_PASSWORD")?,
                host: required("PASTEMED_OLD_DB_SERVER")?,
                port: required("PASTEMED_OLD_DB_PORT")?
                    .parse()
                    .context("PASTEMED_OLD_DB_PORT must be a valid port number")?,
                database: required("PASTEMED_OLD_DB_DATABASE")?,
            },
            database_url: required("DATABASE_URL")?,
        })
    }
}
