/// Metadata Service Library
///
/// Typed handlers over a graph of open-metadata entities, relationships
/// and classifications.
///
/// ## Modules
///
/// - `builders`: Property bag builders for composite elements
/// - `config`: Service configuration
/// - `converters`: Entity to bean conversion
/// - `domain`: Instances, property bags and bean types
/// - `handlers`: Glossary, relational data, facet and reference value handlers
/// - `http`: actix-web routes
/// - `metrics`: Prometheus counters
/// - `repository`: Metadata stores (in-memory, PostgreSQL)
/// - `security`: Zone-based visibility and write checks
/// - `types`: Type registry
/// - `validation`: Parameter validation
pub mod builders;
pub mod config;
pub mod converters;
pub mod domain;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod repository;
pub mod security;
pub mod startup;
pub mod types;
pub mod validation;

pub use config::Config;
pub use error_types::{MetadataError, MetadataResult};
