//! Wiring of repository, security and handlers from configuration

use crate::config::{Config, RepositoryBackend};
use crate::handlers::GenericHandler;
use crate::repository::{InMemoryRepository, MetadataRepository, PostgresRepository};
use crate::security::ZoneSecurityVerifier;
use crate::types::{EntityTypeName, TypeRegistry};
use crate::validation::InvalidParameterHandler;
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Open the configured repository, running migrations for PostgreSQL
pub async fn connect_repository(config: &Config) -> Result<Arc<dyn MetadataRepository>> {
    match config.repository.backend {
        RepositoryBackend::Memory => {
            info!("Using in-memory metadata repository");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        RepositoryBackend::Postgres => {
            let url = config
                .repository
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.repository.max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!(
                max_connections = config.repository.max_connections,
                "Database pool initialized"
            );

            let repository = PostgresRepository::new(pool);
            repository.migrate().await?;
            info!("Database migrations completed");
            Ok(Arc::new(repository))
        }
    }
}

/// Generic handler over `repository` with zone security and the
/// open-metadata type registry
pub fn generic_handler(config: &Config, repository: Arc<dyn MetadataRepository>) -> GenericHandler {
    let metadata = &config.metadata;
    let zones = metadata.zone_settings();
    let security = ZoneSecurityVerifier::new(zones.clone(), metadata.denied_users.iter().cloned());

    let mut registry = TypeRegistry::open_metadata();
    for type_name in &metadata.deprecated_types {
        match type_name.parse::<EntityTypeName>() {
            Ok(entity_type) => registry.deprecate_entity_type(entity_type),
            Err(_) => warn!(%type_name, "Ignoring unknown type in DEPRECATED_TYPES"),
        }
    }

    GenericHandler::new(
        repository,
        Arc::new(security),
        Arc::new(registry),
        InvalidParameterHandler::new(metadata.max_page_size),
        zones,
        &metadata.server_name,
    )
}
