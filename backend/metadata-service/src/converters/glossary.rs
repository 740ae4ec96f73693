use super::{owning_guid, BeanConverter};
use crate::domain::{
    ElementHeader, Entity, GlossaryTermElement, GlossaryTermProperties, RelatedTermElement,
    Relationship, TermRelationshipProperties,
};
use crate::types::EntityTypeName;
use error_types::{MetadataError, MetadataResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct GlossaryTermConverter;

impl BeanConverter for GlossaryTermConverter {
    type Bean = GlossaryTermElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::GlossaryTerm;

    fn build(
        &self,
        entity: &Entity,
        _relationship: Option<&Relationship>,
        _method: &str,
    ) -> MetadataResult<GlossaryTermElement> {
        Ok(GlossaryTermElement {
            header: ElementHeader::from(entity),
            properties: GlossaryTermProperties::from_instance_properties(&entity.properties),
            glossary_guid: owning_guid(entity),
        })
    }
}

/// Term reached through a term-to-term relationship; the relationship is required
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedTermConverter;

impl BeanConverter for RelatedTermConverter {
    type Bean = RelatedTermElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::GlossaryTerm;

    fn build(
        &self,
        entity: &Entity,
        relationship: Option<&Relationship>,
        method: &str,
    ) -> MetadataResult<RelatedTermElement> {
        let relationship = relationship.ok_or_else(|| {
            MetadataError::property_server(
                method,
                format!("no relationship supplied for related term {}", entity.guid),
            )
        })?;

        Ok(RelatedTermElement {
            relationship_guid: relationship.guid,
            relationship_type: relationship.type_name.clone(),
            relationship_properties: TermRelationshipProperties::from_instance_properties(
                &relationship.properties,
            ),
            related_term: GlossaryTermConverter.build(entity, None, method)?,
        })
    }
}
