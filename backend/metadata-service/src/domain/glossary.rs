use super::instance::{ElementHeader, Guid};
use super::properties::{EffectivityWindow, InstanceProperties, PropertyEnum, PropertyValue};
use super::property_names as names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TERM_PROPERTY_NAMES: &[&str] = &[
    names::QUALIFIED_NAME,
    names::DISPLAY_NAME,
    names::SUMMARY,
    names::DESCRIPTION,
    names::EXAMPLES,
    names::ABBREVIATION,
    names::USAGE,
    names::ALIASES,
    names::ADDITIONAL_PROPERTIES,
];

/// Properties of a glossary term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlossaryTermProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub examples: Option<String>,
    pub abbreviation: Option<String>,
    pub usage: Option<String>,
    pub aliases: Vec<String>,
    pub additional_properties: BTreeMap<String, String>,
    pub extended_properties: BTreeMap<String, PropertyValue>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl GlossaryTermProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::SUMMARY, self.summary.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_string(names::EXAMPLES, self.examples.as_deref())
            .with_string(names::ABBREVIATION, self.abbreviation.as_deref())
            .with_string(names::USAGE, self.usage.as_deref())
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
            summary: properties.string(names::SUMMARY).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            examples: properties.string(names::EXAMPLES).map(str::to_string),
            abbreviation: properties.string(names::ABBREVIATION).map(str::to_string),
            usage: properties.string(names::USAGE).map(str::to_string),
            aliases: properties.string_array(names::ALIASES),
            additional_properties: properties.string_map(names::ADDITIONAL_PROPERTIES),
            extended_properties: properties.extended(TERM_PROPERTY_NAMES),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// Replacement values applied when copying a term from a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateProperties {
    pub qualified_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl TemplateProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::QUALIFIED_NAME, self.qualified_name.as_deref())
            .with_string(names::DISPLAY_NAME, self.display_name.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
    }
}

/// Glossary term bean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTermElement {
    pub header: ElementHeader,
    pub properties: GlossaryTermProperties,
    /// Glossary that anchors the term
    pub glossary_guid: Option<Guid>,
}

/// Status of a term-to-term or term-to-category relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermRelationshipStatus {
    Draft,
    Active,
    Deprecated,
    Obsolete,
    Other,
}

impl PropertyEnum for TermRelationshipStatus {
    fn ordinal(&self) -> i32 {
        match self {
            TermRelationshipStatus::Draft => 0,
            TermRelationshipStatus::Active => 1,
            TermRelationshipStatus::Deprecated => 2,
            TermRelationshipStatus::Obsolete => 3,
            TermRelationshipStatus::Other => 99,
        }
    }

    fn symbolic_name(&self) -> &'static str {
        match self {
            TermRelationshipStatus::Draft => "DRAFT",
            TermRelationshipStatus::Active => "ACTIVE",
            TermRelationshipStatus::Deprecated => "DEPRECATED",
            TermRelationshipStatus::Obsolete => "OBSOLETE",
            TermRelationshipStatus::Other => "OTHER",
        }
    }

    fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(TermRelationshipStatus::Draft),
            1 => Some(TermRelationshipStatus::Active),
            2 => Some(TermRelationshipStatus::Deprecated),
            3 => Some(TermRelationshipStatus::Obsolete),
            99 => Some(TermRelationshipStatus::Other),
            _ => None,
        }
    }
}

/// Kind of activity a term describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Operation,
    Action,
    Task,
    Process,
    Project,
    Other,
}

impl PropertyEnum for ActivityType {
    fn ordinal(&self) -> i32 {
        match self {
            ActivityType::Operation => 0,
            ActivityType::Action => 1,
            ActivityType::Task => 2,
            ActivityType::Process => 3,
            ActivityType::Project => 4,
            ActivityType::Other => 99,
        }
    }

    fn symbolic_name(&self) -> &'static str {
        match self {
            ActivityType::Operation => "OPERATION",
            ActivityType::Action => "ACTION",
            ActivityType::Task => "TASK",
            ActivityType::Process => "PROCESS",
            ActivityType::Project => "PROJECT",
            ActivityType::Other => "OTHER",
        }
    }

    fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(ActivityType::Operation),
            1 => Some(ActivityType::Action),
            2 => Some(ActivityType::Task),
            3 => Some(ActivityType::Process),
            4 => Some(ActivityType::Project),
            99 => Some(ActivityType::Other),
            _ => None,
        }
    }
}

/// Properties carried by term-to-term relationships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TermRelationshipProperties {
    pub expression: Option<String>,
    pub description: Option<String>,
    pub status: Option<TermRelationshipStatus>,
    pub steward: Option<String>,
    pub source: Option<String>,
    pub confidence: Option<i32>,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl TermRelationshipProperties {
    pub fn to_instance_properties(&self) -> InstanceProperties {
        InstanceProperties::new()
            .with_string(names::EXPRESSION, self.expression.as_deref())
            .with_string(names::DESCRIPTION, self.description.as_deref())
            .with_enum(names::STATUS, self.status)
            .with_string(names::STEWARD, self.steward.as_deref())
            .with_string(names::SOURCE, self.source.as_deref())
            .with_int(names::CONFIDENCE, self.confidence)
            .with_effectivity(EffectivityWindow::new(self.effective_from, self.effective_to))
    }

    pub fn from_instance_properties(properties: &InstanceProperties) -> Self {
        let window = properties.effectivity();
        Self {
            expression: properties.string(names::EXPRESSION).map(str::to_string),
            description: properties.string(names::DESCRIPTION).map(str::to_string),
            status: properties.enum_value(names::STATUS),
            steward: properties.string(names::STEWARD).map(str::to_string),
            source: properties.string(names::SOURCE).map(str::to_string),
            confidence: properties.int(names::CONFIDENCE),
            effective_from: window.effective_from,
            effective_to: window.effective_to,
        }
    }
}

/// A term reached through a term-to-term relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTermElement {
    pub relationship_guid: Guid,
    pub relationship_type: String,
    pub relationship_properties: TermRelationshipProperties,
    pub related_term: GlossaryTermElement,
}

/// Properties of the Memento classification set when archiving an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchiveProperties {
    pub archive_date: Option<DateTime<Utc>>,
    pub archive_process: Option<String>,
    pub archive_properties: BTreeMap<String, String>,
}
