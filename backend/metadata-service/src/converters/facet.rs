use super::BeanConverter;
use crate::domain::{
    property_names, ElementHeader, Entity, PropertyFacetElement, PropertyFacetProperties,
    Relationship,
};
use crate::types::EntityTypeName;
use error_types::MetadataResult;

/// Facet bean; the ReferenceableFacet relationship contributes its source
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyFacetConverter;

impl BeanConverter for PropertyFacetConverter {
    type Bean = PropertyFacetElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::PropertyFacet;

    fn build(
        &self,
        entity: &Entity,
        relationship: Option<&Relationship>,
        _method: &str,
    ) -> MetadataResult<PropertyFacetElement> {
        Ok(PropertyFacetElement {
            header: ElementHeader::from(entity),
            properties: PropertyFacetProperties::from_instance_properties(&entity.properties),
            relationship_guid: relationship.map(|r| r.guid),
            source: relationship
                .and_then(|r| r.properties.string(property_names::SOURCE))
                .map(str::to_string),
        })
    }
}
