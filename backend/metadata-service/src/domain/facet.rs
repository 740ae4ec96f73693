use super::instance::{ElementHeader, Guid};
use super::properties::{InstanceProperties, PropertyValue};
use super::property_names as names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const FACET_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::SCHEMA_VERSION,
    names::DESCRIPTION,
    names::PROPERTIES,
    names::ADDITIONAL_PROPERTIES,
];

/// Properties read back from a PropertyFacet entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyFacetProperties {
    pub qualified_name: Option<String>,
    pub schema_version: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl PropertyFacetProperties {
    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        let window = properties.effectivity();
        Self {
            qualified_name: properties.string(names::QUALIFIED_NAME).map(str::to_string),
            schema_version: properties.string(names::SCHEMA_VERSION).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            properties: properties.string_map(names::PROPERTIES),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(FACET_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// Facet attached to a referenceable through ReferenceableFacet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFacetElement {
    pub header: ElementHeader,
    pub properties: PropertyFacetProperties,
    pub relationship_guid: Option<Guid>,
    /// Origin of the facet, e.g. the vendor that owns the properties
    pub source: Option<String>,
}
