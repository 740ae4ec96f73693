use super::properties::InstanceProperties;
use super::property_names;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique identifier of an entity, relationship or classification
pub type Guid = Uuid;

/// Lifecycle status of a stored instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Draft,
    Prepared,
    Proposed,
    Approved,
    Rejected,
    #[default]
    Active,
    Deprecated,
    Other,
    Deleted,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Draft => "DRAFT",
            InstanceStatus::Prepared => "PREPARED",
            InstanceStatus::Proposed => "PROPOSED",
            InstanceStatus::Approved => "APPROVED",
            InstanceStatus::Rejected => "REJECTED",
            InstanceStatus::Active => "ACTIVE",
            InstanceStatus::Deprecated => "DEPRECATED",
            InstanceStatus::Other => "OTHER",
            InstanceStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(InstanceStatus::Draft),
            "PREPARED" => Ok(InstanceStatus::Prepared),
            "PROPOSED" => Ok(InstanceStatus::Proposed),
            "APPROVED" => Ok(InstanceStatus::Approved),
            "REJECTED" => Ok(InstanceStatus::Rejected),
            "ACTIVE" => Ok(InstanceStatus::Active),
            "DEPRECATED" => Ok(InstanceStatus::Deprecated),
            "OTHER" => Ok(InstanceStatus::Other),
            "DELETED" => Ok(InstanceStatus::Deleted),
            other => Err(format!("unknown instance status {other}")),
        }
    }
}

/// Back-reference from a dependent entity to its owning top-level entity and
/// governance scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub anchor_guid: Guid,
    pub anchor_type_name: String,
    pub anchor_scope_guid: Option<Guid>,
}

/// Typed tag attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    pub properties: InstanceProperties,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classification {
    pub fn new(name: impl Into<String>, properties: InstanceProperties, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            properties,
            created_by: user_id.to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Node in the metadata graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub guid: Guid,
    pub type_name: String,
    pub status: InstanceStatus,
    pub properties: InstanceProperties,
    pub classifications: Vec<Classification>,
    pub(crate) anchor: Option<Anchor>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Entity {
    pub fn new(guid: Guid, new: NewEntity, now: DateTime<Utc>) -> Self {
        Self {
            guid,
            type_name: new.type_name,
            status: new.status,
            properties: new.properties,
            classifications: new.classifications,
            anchor: new.anchor,
            created_by: new.user_id,
            updated_by: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Owning top-level entity and scope, if this entity is anchored
    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    /// True when this entity is anchored to some other entity
    pub fn is_dependent(&self) -> bool {
        self.anchor
            .as_ref()
            .map_or(false, |anchor| anchor.anchor_guid != self.guid)
    }

    pub fn anchor_scope_guid(&self) -> Option<Guid> {
        self.anchor.as_ref().and_then(|anchor| anchor.anchor_scope_guid)
    }

    pub fn classification(&self, name: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.name == name)
    }

    pub fn is_classified(&self, name: &str) -> bool {
        self.classification(name).is_some()
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.properties.string(property_names::QUALIFIED_NAME)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.properties.string(property_names::DISPLAY_NAME)
    }

    pub fn is_deleted(&self) -> bool {
        self.status == InstanceStatus::Deleted
    }

    pub(crate) fn touch(&mut self, user_id: &str) {
        self.updated_by = Some(user_id.to_string());
        self.updated_at = Utc::now();
        self.version += 1;
    }

    /// Insert or replace a classification, keeping the original creation
    /// metadata on replace
    pub(crate) fn upsert_classification(&mut self, mut classification: Classification) {
        match self
            .classifications
            .iter_mut()
            .find(|c| c.name == classification.name)
        {
            Some(existing) => {
                let updated_by = std::mem::replace(
                    &mut classification.created_by,
                    existing.created_by.clone(),
                );
                classification.created_at = existing.created_at;
                classification.updated_by = Some(updated_by);
                classification.updated_at = Utc::now();
                *existing = classification;
            }
            None => self.classifications.push(classification),
        }
    }

    pub(crate) fn remove_classification(&mut self, name: &str) -> bool {
        let before = self.classifications.len();
        self.classifications.retain(|c| c.name != name);
        self.classifications.len() != before
    }
}

/// Typed, directed edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub guid: Guid,
    pub type_name: String,
    pub end1_guid: Guid,
    pub end2_guid: Guid,
    pub properties: InstanceProperties,
    pub status: InstanceStatus,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Relationship {
    pub fn new(guid: Guid, new: NewRelationship, now: DateTime<Utc>) -> Self {
        Self {
            guid,
            type_name: new.type_name,
            end1_guid: new.end1_guid,
            end2_guid: new.end2_guid,
            properties: new.properties,
            status: InstanceStatus::Active,
            created_by: new.user_id,
            updated_by: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn other_end(&self, guid: Guid) -> Option<Guid> {
        if self.end1_guid == guid {
            Some(self.end2_guid)
        } else if self.end2_guid == guid {
            Some(self.end1_guid)
        } else {
            None
        }
    }

    pub fn touches(&self, guid: Guid) -> bool {
        self.end1_guid == guid || self.end2_guid == guid
    }

    pub fn is_effective_at(&self, time: Option<DateTime<Utc>>) -> bool {
        self.properties.effectivity().is_effective_at(time)
    }

    pub fn is_deleted(&self) -> bool {
        self.status == InstanceStatus::Deleted
    }

    pub(crate) fn touch(&mut self, user_id: &str) {
        self.updated_by = Some(user_id.to_string());
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

/// Request to store a new entity
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub type_name: String,
    pub properties: InstanceProperties,
    pub classifications: Vec<Classification>,
    pub status: InstanceStatus,
    pub anchor: Option<Anchor>,
    pub user_id: String,
}

/// Request to store a new relationship
#[derive(Debug, Clone)]
pub struct NewRelationship {
    pub type_name: String,
    pub end1_guid: Guid,
    pub end2_guid: Guid,
    pub properties: InstanceProperties,
    pub user_id: String,
}

/// Header common to every bean returned by the handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHeader {
    pub guid: Guid,
    pub type_name: String,
    pub status: InstanceStatus,
    pub anchor: Option<Anchor>,
    pub classifications: Vec<String>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<&Entity> for ElementHeader {
    fn from(entity: &Entity) -> Self {
        Self {
            guid: entity.guid,
            type_name: entity.type_name.clone(),
            status: entity.status,
            anchor: entity.anchor.clone(),
            classifications: entity.classifications.iter().map(|c| c.name.clone()).collect(),
            created_by: entity.created_by.clone(),
            updated_by: entity.updated_by.clone(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entity() -> Entity {
        Entity::new(
            Uuid::new_v4(),
            NewEntity {
                type_name: "GlossaryTerm".to_string(),
                properties: InstanceProperties::new()
                    .with_string(property_names::QUALIFIED_NAME, Some("Term::Customer")),
                classifications: Vec::new(),
                status: InstanceStatus::Active,
                anchor: None,
                user_id: "garygeeke".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_instance_status_round_trip() {
        for status in [
            InstanceStatus::Draft,
            InstanceStatus::Active,
            InstanceStatus::Deprecated,
            InstanceStatus::Deleted,
        ] {
            assert_eq!(status.as_str().parse::<InstanceStatus>().unwrap(), status);
        }
        assert!("RETIRED".parse::<InstanceStatus>().is_err());
    }

    #[test]
    fn test_upsert_classification_keeps_creation_metadata() {
        let mut entity = new_entity();
        entity.upsert_classification(Classification::new(
            "AbstractConcept",
            InstanceProperties::new(),
            "garygeeke",
        ));
        let created_at = entity.classifications[0].created_at;

        entity.upsert_classification(Classification::new(
            "AbstractConcept",
            InstanceProperties::new(),
            "erinoverview",
        ));

        assert_eq!(entity.classifications.len(), 1);
        assert_eq!(entity.classifications[0].created_by, "garygeeke");
        assert_eq!(entity.classifications[0].created_at, created_at);
    }

    #[test]
    fn test_self_anchor_is_not_dependent() {
        let mut entity = new_entity();
        assert!(!entity.is_dependent());

        entity.anchor = Some(Anchor {
            anchor_guid: entity.guid,
            anchor_type_name: entity.type_name.clone(),
            anchor_scope_guid: None,
        });
        assert!(!entity.is_dependent());

        entity.anchor = Some(Anchor {
            anchor_guid: Uuid::new_v4(),
            anchor_type_name: "Glossary".to_string(),
            anchor_scope_guid: None,
        });
        assert!(entity.is_dependent());
    }

    #[test]
    fn test_relationship_other_end() {
        let end1 = Uuid::new_v4();
        let end2 = Uuid::new_v4();
        let relationship = Relationship::new(
            Uuid::new_v4(),
            NewRelationship {
                type_name: "TermAnchor".to_string(),
                end1_guid: end1,
                end2_guid: end2,
                properties: InstanceProperties::new(),
                user_id: "garygeeke".to_string(),
            },
            Utc::now(),
        );

        assert_eq!(relationship.other_end(end1), Some(end2));
        assert_eq!(relationship.other_end(end2), Some(end1));
        assert_eq!(relationship.other_end(Uuid::new_v4()), None);
    }
}
