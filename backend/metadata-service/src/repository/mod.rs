mod memory_repository;
mod postgres_repository;
mod query;
mod r#trait;

pub use memory_repository::InMemoryRepository;
pub use postgres_repository::{PostgresRepository, MIGRATOR};
pub use query::{EntityQuery, PropertyMatcher, PropertySearch};
pub use r#trait::MetadataRepository;
