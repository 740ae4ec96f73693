use super::instance::{ElementHeader, Guid};
use super::properties::{EffectivityWindow, InstanceProperties, PropertyValue};
use super::property_names as names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const VALID_VALUE_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::DESCRIPTION,
    names::USAGE,
    names::SCOPE,
    names::PREFERRED_VALUE,
    names::IS_DEPRECATED,
    names::ADDITIONAL_PROPERTIES,
];

/// Properties of a valid value definition or set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidValueProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub scope: Option<String>,
    pub preferred_value: Option<String>,
    pub is_deprecated: Option<bool>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl ValidValueProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_string(names::USAGE, self.usage.as_deref())
            .with_string(names::SCOPE, self.scope.as_deref())
            .with_string(names::PREFERRED_VALUE, self.preferred_value.as_deref())
            .with_bool(names::IS_DEPRECATED, self.is_deprecated)
            .with_string_map(names::ADDITIONAL_PROPERTIES, &self.additional_properties)
            .with_extended(&self.extended_properties)
            .with_effectivity(EffectivityWindow::new(self.effective_from, self.effective_to))
    }

    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        let window = properties.effectivity();
        Self {
            qualified_name: properties.string(names::QUALIFIED_NAME).map(str::to_string),
            display_name: properties.string(names::DISPLAY_NAME).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            usage: properties.string(names::USAGE).map(str::to_string),
            scope: properties.string(names::SCOPE).map(str::to_string),
            preferred_value: properties.string(names::PREFERRED_VALUE).map(str::to_string),
            is_deprecated: properties.bool(names::IS_DEPRECATED),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(VALID_VALUE_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidValueElement {
    pub header: ElementHeader,
    pub properties: ValidValueProperties,
}

/// Properties of the ReferenceValueAssignment relationship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceValueAssignmentProperties {
    pub attribute_name: Option<String>,
    pub confidence: Option<i32>,
    pub steward: Option<String>,
    pub steward_type_name: Option<String>,
    pub steward_property_name: Option<String>,
    pub notes: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl ReferenceValueAssignmentProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::ATTRIBUTE_NAME, self.attribute_name.as_deref())
            .with_int(names::CONFIDENCE, self.confidence)
            .with_string(names::STEWARD, self.steward.as_deref())
            .with_string(names::STEWARD_TYPE_NAME, self.steward_type_name.as_deref())
            .with_string(names::STEWARD_PROPERTY_NAME, self.steward_property_name.as_deref())
            .with_string(names::NOTES, self.notes.as_deref())
            .with_effectivity(EffectivityWindow::new(self.effective_from, self.effective_to))
    }

    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        let window = properties.effectivity();
        Self {
            attribute_name: properties.string(names::ATTRIBUTE_NAME).map(str::to_string),
            confidence: properties.int(names::CONFIDENCE),
            steward: properties.string(names::STEWARD).map(str::to_string),
            steward_type_name: properties.string(names::STEWARD_TYPE_NAME).map(str::to_string),
            steward_property_name: properties
                .string(names::STEWARD_PROPERTY_NAME)
                .map(str::to_string),
            notes: properties.string(names::NOTES).map(str::to_string),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// A valid value together with how it was assigned to an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceValueAssignmentDefinition {
    pub element: ValidValueElement,
    pub properties: ReferenceValueAssignmentProperties,
    pub relationship_guid: Option<Guid>,
}
