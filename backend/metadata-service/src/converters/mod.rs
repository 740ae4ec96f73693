//! Entity (plus optional relationship) to bean conversion

mod facet;
mod glossary;
mod reference_value;
mod relational;

pub use facet::PropertyFacetConverter;
pub use glossary::{GlossaryTermConverter, RelatedTermConverter};
pub use reference_value::{ReferenceValueAssignmentDefinitionConverter, ValidValueConverter};
pub use relational::{
    DatabaseColumnConverter, DatabaseConverter, DatabaseSchemaConverter, DatabaseTableConverter,
};

use crate::domain::{Entity, Relationship};
use crate::types::{EntityTypeName, TypeRegistry};
use error_types::{MetadataError, MetadataResult};

/// Builds one bean type from stored instances
pub trait BeanConverter {
    type Bean;

    /// Every converted entity must be this type or a subtype of it
    const BASE_TYPE: EntityTypeName;

    fn build(
        &self,
        entity: &Entity,
        relationship: Option<&Relationship>,
        method: &str,
    ) -> MetadataResult<Self::Bean>;

    /// Check the entity's type, then build the bean
    fn new_bean(
        &self,
        registry: &TypeRegistry,
        entity: &Entity,
        relationship: Option<&Relationship>,
        method: &str,
    ) -> MetadataResult<Self::Bean> {
        if !registry.is_subtype_name_of(&entity.type_name, Self::BASE_TYPE) {
            return Err(MetadataError::property_server(
                method,
                format!(
                    "unexpected bean type: entity {} is a {} rather than a {}",
                    entity.guid,
                    entity.type_name,
                    Self::BASE_TYPE
                ),
            ));
        }
        self.build(entity, relationship, method)
    }
}

/// Guid of the owning entity when `entity` is anchored elsewhere
pub(crate) fn owning_guid(entity: &Entity) -> Option<crate::domain::Guid> {
    entity
        .anchor()
        .filter(|_| entity.is_dependent())
        .map(|anchor| anchor.anchor_guid)
}
