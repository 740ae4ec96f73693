use super::BeanConverter;
use crate::domain::{
    ElementHeader, Entity, ReferenceValueAssignmentDefinition, ReferenceValueAssignmentProperties,
    Relationship, ValidValueElement, ValidValueProperties,
};
use crate::types::EntityTypeName;
use error_types::MetadataResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidValueConverter;

impl BeanConverter for ValidValueConverter {
    type Bean = ValidValueElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::ValidValueDefinition;

    fn build(&self, entity: &Entity, _: Option<&Relationship>, _: &str) -> MetadataResult<ValidValueElement> {
        Ok(ValidValueElement {
            header: ElementHeader::from(entity),
            properties: ValidValueProperties::from_instance_properties(&entity.properties),
        })
    }
}

/// Valid value plus the ReferenceValueAssignment that attached it.
/// Without a relationship the assignment properties are left at their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceValueAssignmentDefinitionConverter;

impl BeanConverter for ReferenceValueAssignmentDefinitionConverter {
    type Bean = ReferenceValueAssignmentDefinition;
    const BASE_TYPE: EntityTypeName = EntityTypeName::ValidValueDefinition;

    fn build(
        &self,
        entity: &Entity,
        relationship: Option<&Relationship>,
        method: &str,
    ) -> MetadataResult<ReferenceValueAssignmentDefinition> {
        Ok(ReferenceValueAssignmentDefinition {
            element: ValidValueConverter.build(entity, None, method)?,
            properties: relationship
                .map(|r| ReferenceValueAssignmentProperties::from_instance_properties(&r.properties))
                .unwrap_or_default(),
            relationship_guid: relationship.map(|r| r.guid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        property_names, InstanceProperties, InstanceStatus, NewEntity, NewRelationship,
    };
    use crate::types::TypeRegistry;
    use chrono::Utc;
    use uuid::Uuid;

    fn entity(type_name: &str) -> Entity {
        Entity::new(
            Uuid::new_v4(),
            NewEntity {
                type_name: type_name.to_string(),
                properties: InstanceProperties::new()
                    .with_string(property_names::QUALIFIED_NAME, Some("ValidValue::country::NL"))
                    .with_string(property_names::PREFERRED_VALUE, Some("NL")),
                classifications: Vec::new(),
                status: InstanceStatus::Active,
                anchor: None,
                user_id: "garygeeke".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_relationship_contributes_assignment_properties() {
        let valid_value = entity("ValidValueSet");
        let relationship = Relationship::new(
            Uuid::new_v4(),
            NewRelationship {
                type_name: "ReferenceValueAssignment".to_string(),
                end1_guid: Uuid::new_v4(),
                end2_guid: valid_value.guid,
                properties: ReferenceValueAssignmentProperties {
                    attribute_name: Some("countryCode".to_string()),
                    confidence: Some(80),
                    steward: Some("erinoverview".to_string()),
                    notes: Some("ISO 3166".to_string()),
                    ..Default::default()
                }
                .to_instance_properties(),
                user_id: "garygeeke".to_string(),
            },
            Utc::now(),
        );

        let definition = ReferenceValueAssignmentDefinitionConverter
            .new_bean(
                &TypeRegistry::open_metadata(),
                &valid_value,
                Some(&relationship),
                "get_reference_values",
            )
            .unwrap();

        assert_eq!(definition.properties.attribute_name.as_deref(), Some("countryCode"));
        assert_eq!(definition.properties.confidence, Some(80));
        assert_eq!(definition.relationship_guid, Some(relationship.guid));
        assert_eq!(definition.element.properties.preferred_value.as_deref(), Some("NL"));
    }

    #[test]
    fn test_missing_relationship_gives_default_properties() {
        let definition = ReferenceValueAssignmentDefinitionConverter
            .new_bean(&TypeRegistry::open_metadata(), &entity("ValidValueDefinition"), None, "m")
            .unwrap();
        assert_eq!(definition.properties, ReferenceValueAssignmentProperties::default());
        assert!(definition.relationship_guid.is_none());
    }

    #[test]
    fn test_non_valid_value_entity_is_rejected() {
        let error = ReferenceValueAssignmentDefinitionConverter
            .new_bean(&TypeRegistry::open_metadata(), &entity("GlossaryTerm"), None, "m")
            .unwrap_err();
        assert!(error.is_property_server());
    }
}
