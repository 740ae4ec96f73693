//! Builder for PropertyFacet entities and their ReferenceableFacet link

use crate::domain::{property_names, EffectivityWindow, InstanceProperties, PropertyValue};
use crate::types::EntityTypeName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collects the values of a property facet and turns them into the
/// property bags stored on the facet entity and its relationship
///
/// # Example
///
/// ```rust
/// use metadata_service::builders::PropertyFacetBuilder;
///
/// let facet = PropertyFacetBuilder::new("Database::sales::vendor")
///     .with_schema_version("1.0")
///     .with_property("engine", "postgres");
/// assert_eq!(facet.instance_properties().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyFacetBuilder {
    pub qualified_name: Option<String>,
    pub schema_version: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    /// Subtype of PropertyFacet to create; the base type when absent
    pub type_name: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl PropertyFacetBuilder {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: Some(qualified_name.into()),
            ..Default::default()
        }
    }

    pub fn with_schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = Some(schema_version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add one vendor property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_effectivity(mut self, window: EffectivityWindow) -> Self {
        self.effective_from = window.effective_from;
        self.effective_to = window.effective_to;
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Base type used when no subtype is given
    pub fn base_type() -> EntityTypeName {
        EntityTypeName::PropertyFacet
    }

    /// Bag for the facet entity; absent and empty values are omitted
    pub fn instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(property_names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(property_names::SCHEMA_VERSION, self.schema_version.as_deref())
            .with_string(property_names::DESCRIPTION, self.description.as_deref())
            .with_string_map(property_names::PROPERTIES, &self.properties)
            .with_string_map(property_names::ADDITIONAL_PROPERTIES, &self.additional_properties)
            .with_extended(&self.extended_properties)
            .with_effectivity(EffectivityWindow::new(self.effective_from, self.effective_to))
    }

    /// Bag for the ReferenceableFacet relationship
    pub fn facet_relationship_properties(&self, source: Option<&str>) -> InstanceProperties {
        InstanceProperties::new().with_string(property_names::SOURCE, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_omitted() {
        let builder = PropertyFacetBuilder::new("Facet::sales");
        let properties = builder.instance_properties();

        assert_eq!(properties.len(), 1);
        assert_eq!(properties.string(property_names::QUALIFIED_NAME), Some("Facet::sales"));
        assert!(!properties.contains(property_names::PROPERTIES));
        assert!(properties.effectivity().is_unbounded());
    }

    #[test]
    fn test_vendor_properties_and_extended_values() {
        let mut builder = PropertyFacetBuilder::new("Facet::sales")
            .with_schema_version("2")
            .with_description("Vendor specific settings")
            .with_property("engine", "postgres")
            .with_property("collation", "C");
        builder
            .extended_properties
            .insert("retentionDays".to_string(), PropertyValue::Int(30));

        let properties = builder.instance_properties();
        assert_eq!(properties.string_map(property_names::PROPERTIES).len(), 2);
        assert_eq!(properties.int("retentionDays"), Some(30));
        assert_eq!(properties.string(property_names::SCHEMA_VERSION), Some("2"));
    }

    #[test]
    fn test_relationship_carries_source() {
        let builder = PropertyFacetBuilder::new("Facet::sales");
        assert_eq!(
            builder
                .facet_relationship_properties(Some("postgres"))
                .string(property_names::SOURCE),
            Some("postgres")
        );
        assert!(builder.facet_relationship_properties(None).is_empty());
    }
}
