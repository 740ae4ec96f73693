use super::instance::{ElementHeader, Guid};
use super::properties::{EffectivityWindow, InstanceProperties, PropertyEnum, PropertyValue};
use super::property_names as names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PRIMITIVE_SCHEMA_TYPE: &str = "PrimitiveSchemaType";
pub const DERIVED_SCHEMA_TYPE: &str = "DerivedSchemaType";
pub const RELATIONAL_TABLE_TYPE: &str = "RelationalTableType";

const DATABASE_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::DESCRIPTION,
    names::OWNER,
    names::ZONE_MEMBERSHIP,
    names::CREATE_TIME,
    names::MODIFIED_TIME,
    names::ENCODING_TYPE,
    names::ENCODING_LANGUAGE,
    names::ENCODING_DESCRIPTION,
    names::ENCODING_PROPERTIES,
    names::DATABASE_TYPE,
    names::DATABASE_VERSION,
    names::DATABASE_INSTANCE,
    names::DATABASE_IMPORTED_FROM,
    names::ADDITIONAL_PROPERTIES,
];

const SCHEMA_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::DESCRIPTION,
    names::OWNER,
    names::ZONE_MEMBERSHIP,
    names::ADDITIONAL_PROPERTIES,
];

const TABLE_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::DESCRIPTION,
    names::IS_DEPRECATED,
    names::ALIASES,
    names::ADDITIONAL_PROPERTIES,
];

const COLUMN_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::DESCRIPTION,
    names::IS_DEPRECATED,
    names::ALIASES,
    names::POSITION,
    names::MIN_CARDINALITY,
    names::MAX_CARDINALITY,
    names::ALLOWS_DUPLICATE_VALUES,
    names::ORDERED_VALUES,
    names::IS_NULLABLE,
    names::MINIMUM_LENGTH,
    names::LENGTH,
    names::PRECISION,
    names::DEFAULT_VALUE_OVERRIDE,
    names::NATIVE_CLASS,
    names::ADDITIONAL_PROPERTIES,
];

/// Properties of a database asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub zone_membership: Vec<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub encoding_type: Option<String>,
    pub encoding_language: Option<String>,
    pub encoding_description: Option<String>,
    pub encoding_properties: BTreeMap<String, String>,
    pub database_type: Option<String>,
    pub database_version: Option<String>,
    pub database_instance: Option<String>,
    pub database_imported_from: Option<String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    /// Stored on an attached property facet rather than the entity
    pub vendor_properties: BTreeMap<String, String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl DatabaseProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_string(names::OWNER, self.owner.as_deref())
            .with_string_array(names::ZONE_MEMBERSHIP, &self.zone_membership)
            .with_date(names::CREATE_TIME, self.create_time)
            .with_date(names::MODIFIED_TIME, self.modified_time)
            .with_string(names::ENCODING_TYPE, self.encoding_type.as_deref())
            .with_string(names::ENCODING_LANGUAGE, self.encoding_language.as_deref())
            .with_string(names::ENCODING_DESCRIPTION, self.encoding_description.as_deref())
            .with_string_map(names::ENCODING_PROPERTIES, &self.encoding_properties)
            .with_string(names::DATABASE_TYPE, self.database_type.as_deref())
            .with_string(names::DATABASE_VERSION, self.database_version.as_deref())
            .with_string(names::DATABASE_INSTANCE, self.database_instance.as_deref())
            .with_string(names::DATABASE_IMPORTED_FROM, self.database_imported_from.as_deref())
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
            owner: properties.string(names::OWNER).map(str::to_string),
            zone_membership: properties.string_array(names::ZONE_MEMBERSHIP),
            create_time: properties.date(names::CREATE_TIME),
            modified_time: properties.date(names::MODIFIED_TIME),
            encoding_type: properties.string(names::ENCODING_TYPE).map(str::to_string),
            encoding_language: properties.string(names::ENCODING_LANGUAGE).map(str::to_string),
            encoding_description: properties
                .string(names::ENCODING_DESCRIPTION)
                .map(str::to_string),
            encoding_properties: properties.string_map(names::ENCODING_PROPERTIES),
            database_type: properties.string(names::DATABASE_TYPE).map(str::to_string),
            database_version: properties.string(names::DATABASE_VERSION).map(str::to_string),
            database_instance: properties.string(names::DATABASE_INSTANCE).map(str::to_string),
            database_imported_from: properties
                .string(names::DATABASE_IMPORTED_FROM)
                .map(str::to_string),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(DATABASE_PROPERTY_NAMES),
            vendor_properties: BTreeMap::new(),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// Properties of a deployed database schema asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseSchemaProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub zone_membership: Vec<String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl DatabaseSchemaProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_string(names::OWNER, self.owner.as_deref())
            .with_string_array(names::ZONE_MEMBERSHIP, &self.zone_membership)
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
            owner: properties.string(names::OWNER).map(str::to_string),
            zone_membership: properties.string_array(names::ZONE_MEMBERSHIP),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(SCHEMA_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// Properties of a relational table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseTableProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_deprecated: Option<bool>,
    pub aliases: Vec<String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl DatabaseTableProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_bool(names::IS_DEPRECATED, self.is_deprecated)
            .with_string_array(names::ALIASES, &self.aliases)
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
            is_deprecated: properties.bool(names::IS_DEPRECATED),
            aliases: properties.string_array(names::ALIASES),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(TABLE_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }

    /// Embedded schema type of every relational table
    pub fn embedded_type_properties() -> InstanceProperties {
        InstanceProperties::new().with_string(names::SCHEMA_TYPE_NAME, Some(RELATIONAL_TABLE_TYPE))
    }
}

/// Properties of a relational column, including its embedded data type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseColumnProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_deprecated: Option<bool>,
    pub aliases: Vec<String>,
    pub position: Option<i32>,
    pub min_cardinality: Option<i32>,
    pub max_cardinality: Option<i32>,
    pub allows_duplicate_values: Option<bool>,
    pub ordered_values: Option<bool>,
    pub is_nullable: Option<bool>,
    pub minimum_length: Option<i32>,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub default_value_override: Option<String>,
    pub native_class: Option<String>,
    pub data_type: Option<String>,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    pub formula: Option<String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl DatabaseColumnProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_bool(names::IS_DEPRECATED, self.is_deprecated)
            .with_string_array(names::ALIASES, &self.aliases)
            .with_int(names::POSITION, self.position)
            .with_int(names::MIN_CARDINALITY, self.min_cardinality)
            .with_int(names::MAX_CARDINALITY, self.max_cardinality)
            .with_bool(names::ALLOWS_DUPLICATE_VALUES, self.allows_duplicate_values)
            .with_bool(names::ORDERED_VALUES, self.ordered_values)
            .with_bool(names::IS_NULLABLE, self.is_nullable)
            .with_int(names::MINIMUM_LENGTH, self.minimum_length)
            .with_int(names::LENGTH, self.length)
            .with_int(names::PRECISION, self.precision)
            .with_string(names::DEFAULT_VALUE_OVERRIDE, self.default_value_override.as_deref())
            .with_string(names::NATIVE_CLASS, self.native_class.as_deref())
            .with_string_map(names::ADDITIONAL_PROPERTIES, &self.additional_properties)
            .with_extended(&self.extended_properties)
            .with_effectivity(EffectivityWindow::new(self.effective_from, self.effective_to))
    }

    /// Schema type name the column embeds: derived when a formula is given
    pub fn schema_type_name(&self) -> &'static str {
        if self.formula.is_some() {
            DERIVED_SCHEMA_TYPE
        } else {
            PRIMITIVE_SCHEMA_TYPE
        }
    }

    pub fn embedded_type_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::SCHEMA_TYPE_NAME, Some(self.schema_type_name()))
            .with_string(names::DATA_TYPE, self.data_type.as_deref())
            .with_string(names::DEFAULT_VALUE, self.default_value.as_deref())
            .with_string(names::FIXED_VALUE, self.fixed_value.as_deref())
            .with_string(names::FORMULA, self.formula.as_deref())
    }

    /// True when any embedded-type field was supplied
    pub fn has_embedded_type_fields(&self) -> bool {
        self.data_type.is_some()
            || self.default_value.is_some()
            || self.fixed_value.is_some()
            || self.formula.is_some()
    }

    pub fn from_parts(
        properties: &InstanceProperties,
        embedded_type: Option<&InstanceProperties>,
    ) -> Self {
        let window = properties.effectivity();
        let embedded = |name: &str| {
            embedded_type
                .and_then(|props| props.string(name))
                .map(str::to_string)
        };
        Self {
            qualified_name: properties.string(names::QUALIFIED_NAME).map(str::to_string),
            display_name: properties.string(names::DISPLAY_NAME).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            is_deprecated: properties.bool(names::IS_DEPRECATED),
            aliases: properties.string_array(names::ALIASES),
            position: properties.int(names::POSITION),
            min_cardinality: properties.int(names::MIN_CARDINALITY),
            max_cardinality: properties.int(names::MAX_CARDINALITY),
            allows_duplicate_values: properties.bool(names::ALLOWS_DUPLICATE_VALUES),
            ordered_values: properties.bool(names::ORDERED_VALUES),
            is_nullable: properties.bool(names::IS_NULLABLE),
            minimum_length: properties.int(names::MINIMUM_LENGTH),
            length: properties.int(names::LENGTH),
            precision: properties.int(names::PRECISION),
            default_value_override: properties
                .string(names::DEFAULT_VALUE_OVERRIDE)
                .map(str::to_string),
            native_class: properties.string(names::NATIVE_CLASS).map(str::to_string),
            data_type: embedded(names::DATA_TYPE),
            default_value: embedded(names::DEFAULT_VALUE),
            fixed_value: embedded(names::FIXED_VALUE),
            formula: embedded(names::FORMULA),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(COLUMN_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// How primary key values are managed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyPattern {
    LocalKey,
    RecycledKey,
    NaturalKey,
    MirrorKey,
    AggregateKey,
    CallersKey,
    StableKey,
    Other,
}

impl PropertyEnum for KeyPattern {
    fn ordinal(&self) -> i32 {
        match self {
            KeyPattern::LocalKey => 0,
            KeyPattern::RecycledKey => 1,
            KeyPattern::NaturalKey => 2,
            KeyPattern::MirrorKey => 3,
            KeyPattern::AggregateKey => 4,
            KeyPattern::CallersKey => 5,
            KeyPattern::StableKey => 6,
            KeyPattern::Other => 99,
        }
    }

    fn symbolic_name(&self) -> &'static str {
        match self {
            KeyPattern::LocalKey => "LOCAL_KEY",
            KeyPattern::RecycledKey => "RECYCLED_KEY",
            KeyPattern::NaturalKey => "NATURAL_KEY",
            KeyPattern::MirrorKey => "MIRROR_KEY",
            KeyPattern::AggregateKey => "AGGREGATE_KEY",
            KeyPattern::CallersKey => "CALLERS_KEY",
            KeyPattern::StableKey => "STABLE_KEY",
            KeyPattern::Other => "OTHER",
        }
    }

    fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(KeyPattern::LocalKey),
            1 => Some(KeyPattern::RecycledKey),
            2 => Some(KeyPattern::NaturalKey),
            3 => Some(KeyPattern::MirrorKey),
            4 => Some(KeyPattern::AggregateKey),
            5 => Some(KeyPattern::CallersKey),
            6 => Some(KeyPattern::StableKey),
            99 => Some(KeyPattern::Other),
            _ => None,
        }
    }
}

/// Properties of the PrimaryKey classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyProperties {
    pub name: Option<String>,
    pub key_pattern: KeyPattern,
}

impl PrimaryKeyProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::NAME, self.name.as_deref())
            .with_enum(names::KEY_PATTERN, Some(self.key_pattern))
    }

    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        Self {
            name: properties.string(names::NAME).map(str::to_string),
            key_pattern: properties
                .enum_value(names::KEY_PATTERN)
                .unwrap_or(KeyPattern::LocalKey),
        }
    }
}

/// Properties of a ForeignKey relationship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForeignKeyProperties {
    pub name: Option<String>,
    pub description: Option<String>,
    pub confidence: Option<i32>,
    pub steward: Option<String>,
    pub source: Option<String>,
}

impl ForeignKeyProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::NAME, self.name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_int(names::CONFIDENCE, self.confidence)
            .with_string(names::STEWARD, self.steward.as_deref())
            .with_string(names::SOURCE, self.source.as_deref())
    }

    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        Self {
            name: properties.string(names::NAME).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            confidence: properties.int(names::CONFIDENCE),
            steward: properties.string(names::STEWARD).map(str::to_string),
            source: properties.string(names::SOURCE).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseElement {
    pub header: ElementHeader,
    pub properties: DatabaseProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchemaElement {
    pub header: ElementHeader,
    pub properties: DatabaseSchemaProperties,
    /// Database this schema describes the content of
    pub database_guid: Option<Guid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseTableElement {
    pub header: ElementHeader,
    pub properties: DatabaseTableProperties,
    /// Schema asset that anchors the table
    pub database_schema_guid: Option<Guid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseColumnElement {
    pub header: ElementHeader,
    pub properties: DatabaseColumnProperties,
    pub primary_key: Option<PrimaryKeyProperties>,
    /// Schema asset that anchors the column
    pub database_schema_guid: Option<Guid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyElement {
    pub relationship_guid: Guid,
    pub primary_key_column_guid: Guid,
    pub foreign_key_column_guid: Guid,
    pub properties: ForeignKeyProperties,
}
