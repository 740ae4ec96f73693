//! Glossary terms: lifecycle, classifications, categories and term-to-term links

use super::generic::{GenericHandler, LinkEnd, SearchOptions, NAME_PROPERTIES};
use crate::converters::{BeanConverter, GlossaryTermConverter, RelatedTermConverter};
use crate::domain::{
    property_names, ActivityType, ArchiveProperties, Entity, GlossaryTermElement,
    GlossaryTermProperties, Guid, InstanceProperties, InstanceStatus, RelatedTermElement,
    TemplateProperties, TermRelationshipProperties, TermRelationshipStatus,
};
use crate::types::{ClassificationTypeName, EntityTypeName, RelationshipTypeName};
use chrono::{DateTime, Utc};
use error_types::{MetadataError, MetadataResult};
use tracing::debug;

const TERM_GUID: &str = "glossaryTermGUID";
const GLOSSARY_GUID: &str = "glossaryGUID";

/// Term properties searched by value in addition to the defaults
const TERM_SEARCH_PROPERTIES: &[&str] = &[
    property_names::SUMMARY,
    property_names::EXAMPLES,
    property_names::ABBREVIATION,
    property_names::USAGE,
];

/// Relationships copied from a template term on a deep copy
const DEEP_COPY_RELATIONSHIPS: &[RelationshipTypeName] = &[
    RelationshipTypeName::TermCategorization,
    RelationshipTypeName::RelatedTerm,
    RelationshipTypeName::Synonym,
    RelationshipTypeName::Antonym,
    RelationshipTypeName::PreferredTerm,
    RelationshipTypeName::ReplacementTerm,
    RelationshipTypeName::Translation,
    RelationshipTypeName::IsA,
    RelationshipTypeName::ValidValue,
    RelationshipTypeName::UsedInContext,
    RelationshipTypeName::TermISATypeOFRelationship,
    RelationshipTypeName::TermTYPEDBYRelationship,
    RelationshipTypeName::TermHASARelationship,
];

fn term_end(guid: Guid) -> LinkEnd {
    LinkEnd::new(guid, TERM_GUID, EntityTypeName::GlossaryTerm)
}

fn glossary_end(guid: Guid) -> LinkEnd {
    LinkEnd::new(guid, GLOSSARY_GUID, EntityTypeName::Glossary)
}

/// Manages glossary terms anchored to glossaries
#[derive(Clone)]
pub struct GlossaryTermHandler {
    generic: GenericHandler,
}

impl GlossaryTermHandler {
    pub fn new(generic: &GenericHandler) -> Self {
        Self {
            generic: generic.named("glossary_term"),
        }
    }

    fn to_beans(&self, entities: &[Entity], method: &str) -> MetadataResult<Vec<GlossaryTermElement>> {
        entities
            .iter()
            .map(|entity| GlossaryTermConverter.new_bean(self.generic.registry(), entity, None, method))
            .collect()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a term (or a subtype of term) anchored to the glossary
    pub async fn create_glossary_term(
        &self,
        user_id: &str,
        glossary_guid: Guid,
        properties: &GlossaryTermProperties,
        supplied_type_name: Option<&str>,
        initial_status: Option<InstanceStatus>,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_glossary_term";
        self.generic
            .observe(METHOD, async {
                let type_name = self.generic.registry().resolve_entity_subtype(
                    supplied_type_name,
                    EntityTypeName::GlossaryTerm,
                    "suppliedTypeName",
                    METHOD,
                )?;
                self.generic
                    .get_entity(user_id, glossary_guid, GLOSSARY_GUID, EntityTypeName::Glossary, None, METHOD)
                    .await?;

                let term_guid = self
                    .generic
                    .create_bean(
                        user_id,
                        type_name,
                        properties.to_instance_properties(),
                        initial_status,
                        Some(glossary_guid),
                        METHOD,
                    )
                    .await?;

                self.generic
                    .link_elements(
                        user_id,
                        glossary_end(glossary_guid),
                        term_end(term_guid),
                        RelationshipTypeName::TermAnchor,
                        InstanceProperties::new(),
                        METHOD,
                    )
                    .await?;
                Ok(term_guid)
            })
            .await
    }

    /// Copy a template term into the glossary. A deep copy also recreates
    /// the template's category and term-to-term relationships.
    pub async fn create_glossary_term_from_template(
        &self,
        user_id: &str,
        glossary_guid: Guid,
        template_guid: Guid,
        template_properties: &TemplateProperties,
        deep_copy: bool,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_glossary_term_from_template";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .get_entity(user_id, glossary_guid, GLOSSARY_GUID, EntityTypeName::Glossary, None, METHOD)
                    .await?;

                let term_guid = self
                    .generic
                    .create_bean_from_template(
                        user_id,
                        template_guid,
                        EntityTypeName::GlossaryTerm,
                        template_properties.to_instance_properties(),
                        Some(glossary_guid),
                        METHOD,
                    )
                    .await?;

                self.generic
                    .link_elements(
                        user_id,
                        glossary_end(glossary_guid),
                        term_end(term_guid),
                        RelationshipTypeName::TermAnchor,
                        InstanceProperties::new(),
                        METHOD,
                    )
                    .await?;

                if deep_copy {
                    let copied = self
                        .generic
                        .copy_relationships(user_id, template_guid, term_guid, DEEP_COPY_RELATIONSHIPS)
                        .await?;
                    debug!(%term_guid, %template_guid, copied, "Deep copied term relationships");
                }
                Ok(term_guid)
            })
            .await
    }

    pub async fn update_glossary_term(
        &self,
        user_id: &str,
        term_guid: Guid,
        properties: &GlossaryTermProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_glossary_term";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        term_guid,
                        TERM_GUID,
                        EntityTypeName::GlossaryTerm,
                        properties.to_instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn update_glossary_term_status(
        &self,
        user_id: &str,
        term_guid: Guid,
        status: InstanceStatus,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_glossary_term_status";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_status(user_id, term_guid, TERM_GUID, EntityTypeName::GlossaryTerm, status, METHOD)
                    .await
            })
            .await
    }

    /// Overlay the template's properties and classifications onto an existing
    /// term; the term keeps its own qualified name
    pub async fn update_glossary_term_from_template(
        &self,
        user_id: &str,
        term_guid: Guid,
        template_guid: Guid,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_glossary_term_from_template";
        self.generic
            .observe(METHOD, async {
                let term = self
                    .generic
                    .get_entity(user_id, term_guid, TERM_GUID, EntityTypeName::GlossaryTerm, None, METHOD)
                    .await?;
                let template = self
                    .generic
                    .get_entity(user_id, template_guid, "templateGUID", EntityTypeName::GlossaryTerm, None, METHOD)
                    .await?;

                let properties = template
                    .properties
                    .clone()
                    .without(property_names::QUALIFIED_NAME)
                    .with_string(property_names::QUALIFIED_NAME, term.qualified_name());

                self.generic
                    .update_bean(
                        user_id,
                        term_guid,
                        TERM_GUID,
                        EntityTypeName::GlossaryTerm,
                        properties,
                        is_merge_update,
                        METHOD,
                    )
                    .await?;

                for classification in &template.classifications {
                    let Ok(name) = classification.name.parse::<ClassificationTypeName>() else {
                        debug!(name = %classification.name, "Skipping unknown template classification");
                        continue;
                    };
                    if name == ClassificationTypeName::Memento {
                        continue;
                    }
                    self.generic
                        .set_classification(
                            user_id,
                            term_guid,
                            TERM_GUID,
                            EntityTypeName::GlossaryTerm,
                            name,
                            classification.properties.clone(),
                            is_merge_update,
                            METHOD,
                        )
                        .await?;
                }
                Ok(())
            })
            .await
    }

    /// Re-anchor the term to another glossary
    pub async fn move_glossary_term(
        &self,
        user_id: &str,
        term_guid: Guid,
        new_glossary_guid: Guid,
    ) -> MetadataResult<()> {
        const METHOD: &str = "move_glossary_term";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .move_anchored(
                        user_id,
                        term_end(term_guid),
                        LinkEnd::new(new_glossary_guid, "newGlossaryGUID", EntityTypeName::Glossary),
                        RelationshipTypeName::TermAnchor,
                        METHOD,
                    )
                    .await
                    .map(|_| ())
            })
            .await
    }

    // ------------------------------------------------------------------
    // Classifications
    // ------------------------------------------------------------------

    async fn set_term_classification(
        &self,
        user_id: &str,
        term_guid: Guid,
        classification: ClassificationTypeName,
        properties: InstanceProperties,
        method: &'static str,
    ) -> MetadataResult<()> {
        self.generic
            .observe(method, async {
                self.generic
                    .set_classification(
                        user_id,
                        term_guid,
                        TERM_GUID,
                        EntityTypeName::GlossaryTerm,
                        classification,
                        properties,
                        false,
                        method,
                    )
                    .await
            })
            .await
    }

    async fn clear_term_classification(
        &self,
        user_id: &str,
        term_guid: Guid,
        classification: ClassificationTypeName,
        method: &'static str,
    ) -> MetadataResult<()> {
        self.generic
            .observe(method, async {
                self.generic
                    .clear_classification(
                        user_id,
                        term_guid,
                        TERM_GUID,
                        EntityTypeName::GlossaryTerm,
                        classification,
                        method,
                    )
                    .await
            })
            .await
    }

    pub async fn set_term_as_abstract_concept(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::AbstractConcept,
            InstanceProperties::new(),
            "set_term_as_abstract_concept",
        )
        .await
    }

    pub async fn clear_term_as_abstract_concept(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::AbstractConcept,
            "clear_term_as_abstract_concept",
        )
        .await
    }

    pub async fn set_term_as_data_value(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::DataValue,
            InstanceProperties::new(),
            "set_term_as_data_value",
        )
        .await
    }

    pub async fn clear_term_as_data_value(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(user_id, term_guid, ClassificationTypeName::DataValue, "clear_term_as_data_value")
            .await
    }

    pub async fn set_term_as_activity(
        &self,
        user_id: &str,
        term_guid: Guid,
        activity_type: Option<ActivityType>,
    ) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::ActivityDescription,
            InstanceProperties::new().with_enum(property_names::ACTIVITY_TYPE, activity_type),
            "set_term_as_activity",
        )
        .await
    }

    pub async fn clear_term_as_activity(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::ActivityDescription,
            "clear_term_as_activity",
        )
        .await
    }

    pub async fn set_term_as_context(
        &self,
        user_id: &str,
        term_guid: Guid,
        description: Option<&str>,
        scope: Option<&str>,
    ) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::Context,
            InstanceProperties::new()
                .with_string(property_names::DESCRIPTION, description)
                .with_string(property_names::SCOPE, scope),
            "set_term_as_context",
        )
        .await
    }

    pub async fn clear_term_as_context(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(user_id, term_guid, ClassificationTypeName::Context, "clear_term_as_context")
            .await
    }

    pub async fn set_term_as_spine_object(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::SpineObject,
            InstanceProperties::new(),
            "set_term_as_spine_object",
        )
        .await
    }

    pub async fn clear_term_as_spine_object(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(user_id, term_guid, ClassificationTypeName::SpineObject, "clear_term_as_spine_object")
            .await
    }

    pub async fn set_term_as_spine_attribute(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::SpineAttribute,
            InstanceProperties::new(),
            "set_term_as_spine_attribute",
        )
        .await
    }

    pub async fn clear_term_as_spine_attribute(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::SpineAttribute,
            "clear_term_as_spine_attribute",
        )
        .await
    }

    pub async fn set_term_as_object_identifier(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.set_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::ObjectIdentifier,
            InstanceProperties::new(),
            "set_term_as_object_identifier",
        )
        .await
    }

    pub async fn clear_term_as_object_identifier(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        self.clear_term_classification(
            user_id,
            term_guid,
            ClassificationTypeName::ObjectIdentifier,
            "clear_term_as_object_identifier",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Categories and term-to-term relationships
    // ------------------------------------------------------------------

    pub async fn setup_term_category(
        &self,
        user_id: &str,
        category_guid: Guid,
        term_guid: Guid,
        description: Option<&str>,
        status: Option<TermRelationshipStatus>,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "setup_term_category";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .link_elements(
                        user_id,
                        LinkEnd::new(category_guid, "glossaryCategoryGUID", EntityTypeName::GlossaryCategory),
                        term_end(term_guid),
                        RelationshipTypeName::TermCategorization,
                        InstanceProperties::new()
                            .with_string(property_names::DESCRIPTION, description)
                            .with_enum(property_names::STATUS, status),
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn clear_term_category(
        &self,
        user_id: &str,
        category_guid: Guid,
        term_guid: Guid,
    ) -> MetadataResult<()> {
        const METHOD: &str = "clear_term_category";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .unlink_elements(
                        user_id,
                        LinkEnd::new(category_guid, "glossaryCategoryGUID", EntityTypeName::GlossaryCategory),
                        term_end(term_guid),
                        RelationshipTypeName::TermCategorization,
                        METHOD,
                    )
                    .await
                    .map(|_| ())
            })
            .await
    }

    fn check_term_relationship(relationship: RelationshipTypeName, method: &str) -> MetadataResult<()> {
        if !relationship.is_term_to_term() {
            return Err(MetadataError::invalid_parameter(
                "relationshipTypeName",
                method,
                format!("{relationship} is not a relationship between glossary terms"),
            ));
        }
        Ok(())
    }

    pub async fn setup_term_relationship(
        &self,
        user_id: &str,
        term1_guid: Guid,
        term2_guid: Guid,
        relationship: RelationshipTypeName,
        properties: &TermRelationshipProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "setup_term_relationship";
        self.generic
            .observe(METHOD, async {
                Self::check_term_relationship(relationship, METHOD)?;
                self.generic
                    .link_elements(
                        user_id,
                        LinkEnd::new(term1_guid, "glossaryTermOneGUID", EntityTypeName::GlossaryTerm),
                        LinkEnd::new(term2_guid, "glossaryTermTwoGUID", EntityTypeName::GlossaryTerm),
                        relationship,
                        properties.to_instance_properties(),
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn update_term_relationship(
        &self,
        user_id: &str,
        term1_guid: Guid,
        term2_guid: Guid,
        relationship: RelationshipTypeName,
        properties: &TermRelationshipProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_term_relationship";
        self.generic
            .observe(METHOD, async {
                Self::check_term_relationship(relationship, METHOD)?;
                self.generic
                    .get_entity_for_update(user_id, term1_guid, "glossaryTermOneGUID", EntityTypeName::GlossaryTerm, METHOD)
                    .await?;

                let existing = self
                    .generic
                    .find_relationships_between(term1_guid, term2_guid, relationship)
                    .await?;
                if existing.is_empty() {
                    return Err(MetadataError::invalid_parameter(
                        "glossaryTermTwoGUID",
                        METHOD,
                        format!("no {relationship} relationship from {term1_guid} to {term2_guid}"),
                    ));
                }

                for r in existing {
                    self.generic
                        .update_relationship(user_id, r.guid, properties.to_instance_properties(), is_merge_update, METHOD)
                        .await?;
                }
                Ok(())
            })
            .await
    }

    pub async fn clear_term_relationship(
        &self,
        user_id: &str,
        term1_guid: Guid,
        term2_guid: Guid,
        relationship: RelationshipTypeName,
    ) -> MetadataResult<()> {
        const METHOD: &str = "clear_term_relationship";
        self.generic
            .observe(METHOD, async {
                Self::check_term_relationship(relationship, METHOD)?;
                self.generic
                    .unlink_elements(
                        user_id,
                        LinkEnd::new(term1_guid, "glossaryTermOneGUID", EntityTypeName::GlossaryTerm),
                        LinkEnd::new(term2_guid, "glossaryTermTwoGUID", EntityTypeName::GlossaryTerm),
                        relationship,
                        METHOD,
                    )
                    .await
                    .map(|_| ())
            })
            .await
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Soft delete the term together with anything anchored to it
    pub async fn remove_glossary_term(&self, user_id: &str, term_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_glossary_term";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, term_guid, TERM_GUID, EntityTypeName::GlossaryTerm, true, METHOD)
                    .await
            })
            .await
    }

    pub async fn archive_glossary_term(
        &self,
        user_id: &str,
        term_guid: Guid,
        archive: &ArchiveProperties,
    ) -> MetadataResult<()> {
        const METHOD: &str = "archive_glossary_term";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .archive_bean(user_id, term_guid, TERM_GUID, EntityTypeName::GlossaryTerm, archive, METHOD)
                    .await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_term_by_guid(
        &self,
        user_id: &str,
        term_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<GlossaryTermElement> {
        const METHOD: &str = "get_term_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(user_id, term_guid, TERM_GUID, EntityTypeName::GlossaryTerm, effective_time, METHOD)
                    .await?;
                GlossaryTermConverter.new_bean(self.generic.registry(), &entity, None, METHOD)
            })
            .await
    }

    /// Exact match on qualified name, display name or alias
    pub async fn get_terms_by_name(
        &self,
        user_id: &str,
        name: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<GlossaryTermElement>> {
        const METHOD: &str = "get_terms_by_name";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_name(user_id, name, "name", NAME_PROPERTIES, EntityTypeName::GlossaryTerm, options, METHOD)
                    .await?;
                self.to_beans(&entities, METHOD)
            })
            .await
    }

    /// Regular-expression search across the term's descriptive properties
    pub async fn find_terms(
        &self,
        user_id: &str,
        search_string: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<GlossaryTermElement>> {
        const METHOD: &str = "find_terms";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_value(
                        user_id,
                        search_string,
                        "searchString",
                        TERM_SEARCH_PROPERTIES,
                        EntityTypeName::GlossaryTerm,
                        options,
                        METHOD,
                    )
                    .await?;
                self.to_beans(&entities, METHOD)
            })
            .await
    }

    pub async fn get_terms_for_glossary(
        &self,
        user_id: &str,
        glossary_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<GlossaryTermElement>> {
        const METHOD: &str = "get_terms_for_glossary";
        self.generic
            .observe(METHOD, async {
                let related = self
                    .generic
                    .get_related_entities(
                        user_id,
                        glossary_guid,
                        GLOSSARY_GUID,
                        EntityTypeName::Glossary,
                        &[RelationshipTypeName::TermAnchor],
                        EntityTypeName::GlossaryTerm,
                        options,
                        METHOD,
                    )
                    .await?;
                let entities: Vec<Entity> = related.into_iter().map(|(_, entity)| entity).collect();
                self.to_beans(&entities, METHOD)
            })
            .await
    }

    pub async fn get_terms_for_glossary_category(
        &self,
        user_id: &str,
        category_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<GlossaryTermElement>> {
        const METHOD: &str = "get_terms_for_glossary_category";
        self.generic
            .observe(METHOD, async {
                let related = self
                    .generic
                    .get_related_entities(
                        user_id,
                        category_guid,
                        "glossaryCategoryGUID",
                        EntityTypeName::GlossaryCategory,
                        &[RelationshipTypeName::TermCategorization],
                        EntityTypeName::GlossaryTerm,
                        options,
                        METHOD,
                    )
                    .await?;
                let entities: Vec<Entity> = related.into_iter().map(|(_, entity)| entity).collect();
                self.to_beans(&entities, METHOD)
            })
            .await
    }

    /// Terms linked by one term-to-term relationship type, or by any of them
    pub async fn get_related_terms(
        &self,
        user_id: &str,
        term_guid: Guid,
        relationship: Option<RelationshipTypeName>,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<RelatedTermElement>> {
        const METHOD: &str = "get_related_terms";
        self.generic
            .observe(METHOD, async {
                let relationships: Vec<RelationshipTypeName> = match relationship {
                    Some(relationship) => {
                        Self::check_term_relationship(relationship, METHOD)?;
                        vec![relationship]
                    }
                    None => RelationshipTypeName::TERM_TO_TERM.to_vec(),
                };

                let related = self
                    .generic
                    .get_related_entities(
                        user_id,
                        term_guid,
                        TERM_GUID,
                        EntityTypeName::GlossaryTerm,
                        &relationships,
                        EntityTypeName::GlossaryTerm,
                        options,
                        METHOD,
                    )
                    .await?;

                related
                    .iter()
                    .map(|(r, entity)| {
                        RelatedTermConverter.new_bean(self.generic.registry(), entity, Some(r), METHOD)
                    })
                    .collect()
            })
            .await
    }
}
