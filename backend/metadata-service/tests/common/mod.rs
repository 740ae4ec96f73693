//! Shared fixture for handler integration tests
//!
//! Builds the full handler stack over an in-memory repository, configured
//! through the same key lookup the service uses for its environment.
#![allow(dead_code)]

use metadata_service::config::Config;
use metadata_service::domain::{property_names, Guid, InstanceProperties};
use metadata_service::handlers::{
    GenericHandler, GlossaryTermHandler, PropertyFacetHandler, ReferenceValueHandler,
    RelationalDataHandler,
};
use metadata_service::repository::InMemoryRepository;
use metadata_service::startup;
use metadata_service::types::EntityTypeName;
use std::collections::HashMap;
use std::sync::Arc;

pub const USER: &str = "garygeeke";

pub fn config(pairs: &[(&str, &str)]) -> Config {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| values.get(key).cloned()).expect("test configuration is valid")
}

pub struct Fixture {
    pub generic: GenericHandler,
    pub glossary_terms: GlossaryTermHandler,
    pub relational: RelationalDataHandler,
    pub facets: PropertyFacetHandler,
    pub reference_values: ReferenceValueHandler,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    pub fn with_env(pairs: &[(&str, &str)]) -> Self {
        let repository = Arc::new(InMemoryRepository::new());
        let generic = startup::generic_handler(&config(pairs), repository);
        Self {
            glossary_terms: GlossaryTermHandler::new(&generic),
            relational: RelationalDataHandler::new(&generic),
            facets: PropertyFacetHandler::new(&generic),
            reference_values: ReferenceValueHandler::new(&generic),
            generic,
        }
    }

    async fn create(&self, type_name: EntityTypeName, qualified_name: &str) -> Guid {
        self.generic
            .create_bean(
                USER,
                type_name,
                InstanceProperties::new()
                    .with_string(property_names::QUALIFIED_NAME, Some(qualified_name))
                    .with_string(property_names::DISPLAY_NAME, Some(qualified_name)),
                None,
                None,
                "test_fixture",
            )
            .await
            .expect("fixture element is created")
    }

    pub async fn create_glossary(&self, qualified_name: &str) -> Guid {
        self.create(EntityTypeName::Glossary, qualified_name).await
    }

    pub async fn create_category(&self, qualified_name: &str) -> Guid {
        self.create(EntityTypeName::GlossaryCategory, qualified_name).await
    }

    pub async fn create_database_manager(&self, qualified_name: &str) -> Guid {
        self.create(EntityTypeName::DatabaseManager, qualified_name).await
    }
}
