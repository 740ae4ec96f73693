//! Configuration management for the metadata service
//!
//! Settings come from environment variables, with a `.env` file loaded
//! first during local development.

use crate::security::ZoneSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub repository: RepositoryConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub backend: RepositoryBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub server_name: String,
    pub max_page_size: usize,
    pub supported_zones: Vec<String>,
    pub default_zones: Vec<String>,
    pub publish_zones: Vec<String>,
    pub denied_users: Vec<String>,
    /// Entity types refused for new instances
    pub deprecated_types: Vec<String>,
}

impl MetadataConfig {
    pub fn zone_settings(&self) -> ZoneSettings {
        ZoneSettings {
            supported_zones: self.supported_zones.clone(),
            default_zones: self.default_zones.clone(),
            publish_zones: self.publish_zones.clone(),
        }
    }
}

/// Comma separated list; blank entries are dropped
fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("REPOSITORY_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => RepositoryBackend::Memory,
            "postgres" => RepositoryBackend::Postgres,
            other => bail!("Invalid REPOSITORY_BACKEND: {other}"),
        };

        let database_url = lookup("DATABASE_URL");
        if backend == RepositoryBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set for the postgres backend");
        }

        Ok(Self {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .unwrap_or_else(|| "8090".to_string())
                    .parse()
                    .context("Invalid PORT")?,
            },
            repository: RepositoryConfig {
                backend,
                database_url,
                max_connections: lookup("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .context("Invalid DB_MAX_CONNECTIONS")?,
            },
            metadata: MetadataConfig {
                server_name: lookup("METADATA_SERVER_NAME")
                    .unwrap_or_else(|| "metadata-service".to_string()),
                max_page_size: lookup("MAX_PAGE_SIZE")
                    .unwrap_or_else(|| "500".to_string())
                    .parse()
                    .context("Invalid MAX_PAGE_SIZE")?,
                supported_zones: parse_list(lookup("SUPPORTED_ZONES")),
                default_zones: parse_list(lookup("DEFAULT_ZONES")),
                publish_zones: parse_list(lookup("PUBLISH_ZONES")),
                denied_users: parse_list(lookup("DENIED_USERS")),
                deprecated_types: parse_list(lookup("DEPRECATED_TYPES")),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
