use super::generic::{GenericHandler, LinkEnd, SearchOptions};
use crate::builders::PropertyFacetBuilder;
use crate::converters::{BeanConverter, PropertyFacetConverter};
use crate::domain::{Guid, PropertyFacetElement};
use crate::types::{EntityTypeName, RelationshipTypeName};
use error_types::MetadataResult;
use std::collections::BTreeMap;
use tracing::debug;

/// Relationship source marking the facet that holds vendor properties
pub const VENDOR_PROPERTIES_SOURCE: &str = "vendorProperties";
const VENDOR_PROPERTIES_SCHEMA_VERSION: &str = "1.0";

/// Attaches property facets to referenceables
#[derive(Clone)]
pub struct PropertyFacetHandler {
    generic: GenericHandler,
}

impl PropertyFacetHandler {
    pub fn new(generic: &GenericHandler) -> Self {
        Self {
            generic: generic.named("property_facet"),
        }
    }

    pub async fn add_property_facet(
        &self,
        user_id: &str,
        referenceable_guid: Guid,
        source: Option<&str>,
        builder: &PropertyFacetBuilder,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "add_property_facet";
        self.generic
            .observe(METHOD, async {
                self.create_facet(user_id, referenceable_guid, source, builder, METHOD)
                    .await
            })
            .await
    }

    async fn create_facet(
        &self,
        user_id: &str,
        referenceable_guid: Guid,
        source: Option<&str>,
        builder: &PropertyFacetBuilder,
        method: &str,
    ) -> MetadataResult<Guid> {
        let type_name = self.generic.registry().resolve_entity_subtype(
            builder.type_name(),
            PropertyFacetBuilder::base_type(),
            "typeName",
            method,
        )?;

        // Fail before creating anything when the referenceable is unknown
        self.generic
            .get_entity(user_id, referenceable_guid, "referenceableGUID", EntityTypeName::Referenceable, None, method)
            .await?;

        let facet_guid = self
            .generic
            .create_bean(user_id, type_name, builder.instance_properties(), None, None, method)
            .await?;

        self.generic
            .link_elements(
                user_id,
                LinkEnd::new(referenceable_guid, "referenceableGUID", EntityTypeName::Referenceable),
                LinkEnd::new(facet_guid, "propertyFacetGUID", EntityTypeName::PropertyFacet),
                RelationshipTypeName::ReferenceableFacet,
                builder.facet_relationship_properties(source),
                method,
            )
            .await?;
        Ok(facet_guid)
    }

    pub async fn update_property_facet(
        &self,
        user_id: &str,
        facet_guid: Guid,
        builder: &PropertyFacetBuilder,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_property_facet";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        facet_guid,
                        "propertyFacetGUID",
                        EntityTypeName::PropertyFacet,
                        builder.instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn remove_property_facet(&self, user_id: &str, facet_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_property_facet";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, facet_guid, "propertyFacetGUID", EntityTypeName::PropertyFacet, false, METHOD)
                    .await
            })
            .await
    }

    pub async fn get_property_facets(
        &self,
        user_id: &str,
        referenceable_guid: Guid,
        start_from: i32,
        page_size: i32,
    ) -> MetadataResult<Vec<PropertyFacetElement>> {
        const METHOD: &str = "get_property_facets";
        self.generic
            .observe(METHOD, async {
                self.facets(user_id, referenceable_guid, SearchOptions::paged(start_from, page_size), METHOD)
                    .await
            })
            .await
    }

    async fn facets(
        &self,
        user_id: &str,
        referenceable_guid: Guid,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<PropertyFacetElement>> {
        let related = self
            .generic
            .get_related_entities(
                user_id,
                referenceable_guid,
                "referenceableGUID",
                EntityTypeName::Referenceable,
                &[RelationshipTypeName::ReferenceableFacet],
                EntityTypeName::PropertyFacet,
                options,
                method,
            )
            .await?;

        related
            .iter()
            .map(|(relationship, entity)| {
                PropertyFacetConverter.new_bean(self.generic.registry(), entity, Some(relationship), method)
            })
            .collect()
    }

    async fn vendor_facet(
        &self,
        user_id: &str,
        element_guid: Guid,
        method: &str,
    ) -> MetadataResult<Option<PropertyFacetElement>> {
        Ok(self
            .facets(user_id, element_guid, SearchOptions::paged(0, 0), method)
            .await?
            .into_iter()
            .find(|facet| facet.source.as_deref() == Some(VENDOR_PROPERTIES_SOURCE)))
    }

    /// Vendor properties of an element; empty when none are stored
    pub async fn get_vendor_properties(
        &self,
        user_id: &str,
        element_guid: Guid,
        method: &str,
    ) -> MetadataResult<BTreeMap<String, String>> {
        Ok(self
            .vendor_facet(user_id, element_guid, method)
            .await?
            .map(|facet| facet.properties.properties)
            .unwrap_or_default())
    }

    /// Replace the element's vendor properties; an empty map removes the facet
    pub async fn set_vendor_properties(
        &self,
        user_id: &str,
        element_guid: Guid,
        element_qualified_name: &str,
        vendor_properties: &BTreeMap<String, String>,
        method: &str,
    ) -> MetadataResult<()> {
        let existing = self.vendor_facet(user_id, element_guid, method).await?;

        match (existing, vendor_properties.is_empty()) {
            (None, true) => {
                debug!(%element_guid, "No vendor properties to store");
                Ok(())
            }
            (Some(facet), true) => {
                self.generic
                    .delete_bean(user_id, facet.header.guid, "propertyFacetGUID", EntityTypeName::PropertyFacet, false, method)
                    .await
            }
            (existing, false) => {
                let builder = PropertyFacetBuilder::new(format!("{element_qualified_name}::{VENDOR_PROPERTIES_SOURCE}"))
                    .with_schema_version(VENDOR_PROPERTIES_SCHEMA_VERSION)
                    .with_description("Properties specific to the vendor of the technology")
                    .with_properties(vendor_properties.clone());

                match existing {
                    Some(facet) => {
                        self.generic
                            .update_bean(
                                user_id,
                                facet.header.guid,
                                "propertyFacetGUID",
                                EntityTypeName::PropertyFacet,
                                builder.instance_properties(),
                                false,
                                method,
                            )
                            .await
                    }
                    None => self
                        .create_facet(user_id, element_guid, Some(VENDOR_PROPERTIES_SOURCE), &builder, method)
                        .await
                        .map(|_| ()),
                }
            }
        }
    }
}
