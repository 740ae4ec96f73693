use super::generic::{GenericHandler, LinkEnd, SearchOptions};
use crate::converters::{BeanConverter, ReferenceValueAssignmentDefinitionConverter, ValidValueConverter};
use crate::domain::{
    Guid, ReferenceValueAssignmentDefinition, ReferenceValueAssignmentProperties, ValidValueElement,
    ValidValueProperties,
};
use crate::types::{EntityTypeName, RelationshipTypeName};
use chrono::{DateTime, Utc};
use error_types::MetadataResult;

const ELEMENT_GUID: &str = "elementGUID";
const VALID_VALUE_GUID: &str = "validValueGUID";

/// Valid values and their assignment to other elements as reference values
#[derive(Clone)]
pub struct ReferenceValueHandler {
    generic: GenericHandler,
}

impl ReferenceValueHandler {
    pub fn new(generic: &GenericHandler) -> Self {
        Self {
            generic: generic.named("reference_value"),
        }
    }

    fn ends(element_guid: Guid, valid_value_guid: Guid) -> (LinkEnd, LinkEnd) {
        (
            LinkEnd::new(element_guid, ELEMENT_GUID, EntityTypeName::Referenceable),
            LinkEnd::new(valid_value_guid, VALID_VALUE_GUID, EntityTypeName::ValidValueDefinition),
        )
    }

    pub async fn create_valid_value(
        &self,
        user_id: &str,
        properties: &ValidValueProperties,
        supplied_type_name: Option<&str>,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_valid_value";
        self.generic
            .observe(METHOD, async {
                let type_name = self.generic.registry().resolve_entity_subtype(
                    supplied_type_name,
                    EntityTypeName::ValidValueDefinition,
                    "suppliedTypeName",
                    METHOD,
                )?;
                self.generic
                    .create_bean(user_id, type_name, properties.to_instance_properties(), None, None, METHOD)
                    .await
            })
            .await
    }

    pub async fn get_valid_value_by_guid(
        &self,
        user_id: &str,
        valid_value_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<ValidValueElement> {
        const METHOD: &str = "get_valid_value_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(
                        user_id,
                        valid_value_guid,
                        VALID_VALUE_GUID,
                        EntityTypeName::ValidValueDefinition,
                        effective_time,
                        METHOD,
                    )
                    .await?;
                ValidValueConverter.new_bean(self.generic.registry(), &entity, None, METHOD)
            })
            .await
    }

    /// Assigning the same valid value twice replaces the assignment properties
    pub async fn assign_reference_value(
        &self,
        user_id: &str,
        element_guid: Guid,
        valid_value_guid: Guid,
        properties: &ReferenceValueAssignmentProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "assign_reference_value";
        self.generic
            .observe(METHOD, async {
                let existing = self
                    .generic
                    .find_relationships_between(element_guid, valid_value_guid, RelationshipTypeName::ReferenceValueAssignment)
                    .await?;

                if let Some(assignment) = existing.first() {
                    self.generic
                        .update_relationship(user_id, assignment.guid, properties.to_instance_properties(), false, METHOD)
                        .await?;
                    return Ok(assignment.guid);
                }

                let (element, valid_value) = Self::ends(element_guid, valid_value_guid);
                self.generic
                    .link_elements(
                        user_id,
                        element,
                        valid_value,
                        RelationshipTypeName::ReferenceValueAssignment,
                        properties.to_instance_properties(),
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn unassign_reference_value(
        &self,
        user_id: &str,
        element_guid: Guid,
        valid_value_guid: Guid,
    ) -> MetadataResult<()> {
        const METHOD: &str = "unassign_reference_value";
        self.generic
            .observe(METHOD, async {
                let (element, valid_value) = Self::ends(element_guid, valid_value_guid);
                self.generic
                    .unlink_elements(user_id, element, valid_value, RelationshipTypeName::ReferenceValueAssignment, METHOD)
                    .await
                    .map(|_| ())
            })
            .await
    }

    pub async fn get_reference_values(
        &self,
        user_id: &str,
        element_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<ReferenceValueAssignmentDefinition>> {
        const METHOD: &str = "get_reference_values";
        self.generic
            .observe(METHOD, async {
                let related = self
                    .generic
                    .get_related_entities(
                        user_id,
                        element_guid,
                        ELEMENT_GUID,
                        EntityTypeName::Referenceable,
                        &[RelationshipTypeName::ReferenceValueAssignment],
                        EntityTypeName::ValidValueDefinition,
                        options,
                        METHOD,
                    )
                    .await?;

                related
                    .iter()
                    // The element may itself be a valid value assigned elsewhere
                    .filter(|(r, _)| r.end1_guid == element_guid)
                    .map(|(r, entity)| {
                        ReferenceValueAssignmentDefinitionConverter.new_bean(
                            self.generic.registry(),
                            entity,
                            Some(r),
                            METHOD,
                        )
                    })
                    .collect()
            })
            .await
    }
}
