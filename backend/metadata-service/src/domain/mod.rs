//! Metadata graph instances and the typed beans built from them

pub mod facet;
pub mod glossary;
pub mod instance;
pub mod properties;
pub mod property_names;
pub mod reference_value;
pub mod relational;

pub use facet::{PropertyFacetElement, PropertyFacetProperties};
pub use glossary::{
    ActivityType, ArchiveProperties, GlossaryTermElement, GlossaryTermProperties,
    RelatedTermElement, TemplateProperties, TermRelationshipProperties, TermRelationshipStatus,
};
pub use instance::{
    Anchor, Classification, ElementHeader, Entity, Guid, InstanceStatus, NewEntity,
    NewRelationship, Relationship,
};
pub use properties::{EffectivityWindow, InstanceProperties, PropertyEnum, PropertyValue};
pub use reference_value::{
    ReferenceValueAssignmentDefinition, ReferenceValueAssignmentProperties, ValidValueElement,
    ValidValueProperties,
};
pub use relational::{
    DatabaseColumnElement, DatabaseColumnProperties, DatabaseElement, DatabaseProperties,
    DatabaseSchemaElement, DatabaseSchemaProperties, DatabaseTableElement,
    DatabaseTableProperties, ForeignKeyElement, ForeignKeyProperties, KeyPattern,
    PrimaryKeyProperties,
};
