//! Closed set of open-metadata types known to this service
//!
//! The registry records each entity type's super type and status, which
//! entity types a classification may be attached to, the end types of each
//! relationship and whether a relationship anchors its second end.

use error_types::{MetadataError, MetadataResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Returned when a type name does not parse into one of the closed enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type name {0}")]
pub struct UnknownTypeName(pub String);

macro_rules! type_names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTypeName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(UnknownTypeName(other.to_string())),
                }
            }
        }
    };
}

type_names!(
    /// Entity types
    EntityTypeName {
        Referenceable,
        Asset,
        DataStore,
        Database,
        DataSet,
        DeployedDatabaseSchema,
        Glossary,
        GlossaryCategory,
        GlossaryTerm,
        ControlledGlossaryTerm,
        SchemaElement,
        SchemaType,
        ComplexSchemaType,
        RelationalDBSchemaType,
        RelationalTableType,
        PrimitiveSchemaType,
        DerivedSchemaType,
        SchemaAttribute,
        RelationalTable,
        RelationalColumn,
        PropertyFacet,
        ValidValueDefinition,
        ValidValueSet,
        DatabaseManager,
    }
);

type_names!(
    /// Classification types
    ClassificationTypeName {
        AbstractConcept,
        DataValue,
        ActivityDescription,
        Context,
        SpineObject,
        SpineAttribute,
        ObjectIdentifier,
        PrimaryKey,
        TypeEmbeddedAttribute,
        Memento,
        CalculatedValue,
    }
);

type_names!(
    /// Relationship types
    RelationshipTypeName {
        TermAnchor,
        TermCategorization,
        RelatedTerm,
        Synonym,
        Antonym,
        PreferredTerm,
        ReplacementTerm,
        Translation,
        IsA,
        ValidValue,
        UsedInContext,
        TermISATypeOFRelationship,
        TermTYPEDBYRelationship,
        TermHASARelationship,
        DataContentForDataSet,
        AssetSchemaType,
        AttributeForSchema,
        NestedSchemaAttribute,
        ForeignKey,
        ReferenceableFacet,
        ReferenceValueAssignment,
        ServerAssetUse,
    }
);

impl RelationshipTypeName {
    /// Relationship types that link one glossary term to another
    pub const TERM_TO_TERM: &'static [RelationshipTypeName] = &[
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

    pub fn is_term_to_term(&self) -> bool {
        Self::TERM_TO_TERM.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeStatus {
    Active,
    Deprecated,
}

/// How a relationship derives the anchor of its second end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRule {
    /// end1 (or end1's anchor) becomes the anchor of end2
    Anchors,
    /// As `Anchors`, and end1 also becomes end2's governance scope
    AnchorsWithScope,
    /// end2 stays self-anchored but end1 becomes its governance scope
    ScopesOnly,
}

/// Why a type name could not be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeLookupError {
    #[error("type {0} is not known")]
    Unknown(String),
    #[error("type {0} is not active")]
    Inactive(String),
}

#[derive(Debug, Clone)]
struct EntityTypeDef {
    super_type: Option<EntityTypeName>,
    status: TypeStatus,
}

#[derive(Debug, Clone)]
struct ClassificationTypeDef {
    valid_for: EntityTypeName,
    status: TypeStatus,
}

#[derive(Debug, Clone)]
struct RelationshipTypeDef {
    end1: EntityTypeName,
    end2: EntityTypeName,
    anchor_rule: Option<AnchorRule>,
    status: TypeStatus,
}

/// Type definitions for entities, classifications and relationships
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entities: HashMap<EntityTypeName, EntityTypeDef>,
    classifications: HashMap<ClassificationTypeName, ClassificationTypeDef>,
    relationships: HashMap<RelationshipTypeName, RelationshipTypeDef>,
}

impl TypeRegistry {
    /// Registry holding the open metadata types the handlers use
    pub fn open_metadata() -> Self {
        use ClassificationTypeName as C;
        use EntityTypeName as E;
        use RelationshipTypeName as R;

        let entity_types = [
            (E::Referenceable, None),
            (E::Asset, Some(E::Referenceable)),
            (E::DataStore, Some(E::Asset)),
            (E::Database, Some(E::DataStore)),
            (E::DataSet, Some(E::Asset)),
            (E::DeployedDatabaseSchema, Some(E::DataSet)),
            (E::Glossary, Some(E::Referenceable)),
            (E::GlossaryCategory, Some(E::Referenceable)),
            (E::GlossaryTerm, Some(E::Referenceable)),
            (E::ControlledGlossaryTerm, Some(E::GlossaryTerm)),
            (E::SchemaElement, Some(E::Referenceable)),
            (E::SchemaType, Some(E::SchemaElement)),
            (E::ComplexSchemaType, Some(E::SchemaType)),
            (E::RelationalDBSchemaType, Some(E::ComplexSchemaType)),
            (E::RelationalTableType, Some(E::ComplexSchemaType)),
            (E::PrimitiveSchemaType, Some(E::SchemaType)),
            (E::DerivedSchemaType, Some(E::SchemaType)),
            (E::SchemaAttribute, Some(E::SchemaElement)),
            (E::RelationalTable, Some(E::SchemaAttribute)),
            (E::RelationalColumn, Some(E::SchemaAttribute)),
            (E::PropertyFacet, Some(E::Referenceable)),
            (E::ValidValueDefinition, Some(E::Referenceable)),
            (E::ValidValueSet, Some(E::ValidValueDefinition)),
            (E::DatabaseManager, Some(E::Referenceable)),
        ];

        let classification_types = [
            (C::AbstractConcept, E::GlossaryTerm),
            (C::DataValue, E::GlossaryTerm),
            (C::ActivityDescription, E::GlossaryTerm),
            (C::Context, E::GlossaryTerm),
            (C::SpineObject, E::GlossaryTerm),
            (C::SpineAttribute, E::GlossaryTerm),
            (C::ObjectIdentifier, E::GlossaryTerm),
            (C::PrimaryKey, E::SchemaAttribute),
            (C::TypeEmbeddedAttribute, E::SchemaAttribute),
            (C::CalculatedValue, E::SchemaElement),
            (C::Memento, E::Referenceable),
        ];

        let mut relationship_types = vec![
            (R::TermAnchor, E::Glossary, E::GlossaryTerm, Some(AnchorRule::AnchorsWithScope)),
            (R::TermCategorization, E::GlossaryCategory, E::GlossaryTerm, None),
            (R::DataContentForDataSet, E::Asset, E::DataSet, Some(AnchorRule::ScopesOnly)),
            (R::AssetSchemaType, E::Asset, E::SchemaType, Some(AnchorRule::Anchors)),
            (R::AttributeForSchema, E::ComplexSchemaType, E::SchemaAttribute, Some(AnchorRule::Anchors)),
            (R::NestedSchemaAttribute, E::SchemaAttribute, E::SchemaAttribute, Some(AnchorRule::Anchors)),
            (R::ForeignKey, E::RelationalColumn, E::RelationalColumn, None),
            (R::ReferenceableFacet, E::Referenceable, E::PropertyFacet, Some(AnchorRule::Anchors)),
            (R::ReferenceValueAssignment, E::Referenceable, E::ValidValueDefinition, None),
            (R::ServerAssetUse, E::DatabaseManager, E::Asset, None),
        ];
        for term_relationship in RelationshipTypeName::TERM_TO_TERM {
            relationship_types.push((*term_relationship, E::GlossaryTerm, E::GlossaryTerm, None));
        }

        Self {
            entities: entity_types
                .into_iter()
                .map(|(name, super_type)| {
                    (
                        name,
                        EntityTypeDef {
                            super_type,
                            status: TypeStatus::Active,
                        },
                    )
                })
                .collect(),
            classifications: classification_types
                .into_iter()
                .map(|(name, valid_for)| {
                    (
                        name,
                        ClassificationTypeDef {
                            valid_for,
                            status: TypeStatus::Active,
                        },
                    )
                })
                .collect(),
            relationships: relationship_types
                .into_iter()
                .map(|(name, end1, end2, anchor_rule)| {
                    (
                        name,
                        RelationshipTypeDef {
                            end1,
                            end2,
                            anchor_rule,
                            status: TypeStatus::Active,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Mark an entity type as deprecated so new instances are refused
    pub fn deprecate_entity_type(&mut self, type_name: EntityTypeName) {
        if let Some(definition) = self.entities.get_mut(&type_name) {
            definition.status = TypeStatus::Deprecated;
        }
    }

    pub fn entity_type_status(&self, type_name: EntityTypeName) -> TypeStatus {
        self.entities
            .get(&type_name)
            .map_or(TypeStatus::Deprecated, |definition| definition.status)
    }

    pub fn lookup_entity_type(&self, type_name: &str) -> Result<EntityTypeName, TypeLookupError> {
        let parsed = type_name
            .parse::<EntityTypeName>()
            .map_err(|_| TypeLookupError::Unknown(type_name.to_string()))?;
        match self.entity_type_status(parsed) {
            TypeStatus::Active => Ok(parsed),
            TypeStatus::Deprecated => Err(TypeLookupError::Inactive(type_name.to_string())),
        }
    }

    pub fn is_subtype_of(&self, type_name: EntityTypeName, base: EntityTypeName) -> bool {
        let mut current = Some(type_name);
        while let Some(candidate) = current {
            if candidate == base {
                return true;
            }
            current = self
                .entities
                .get(&candidate)
                .and_then(|definition| definition.super_type);
        }
        false
    }

    /// Same as `is_subtype_of` for a stored type name; unknown names never match
    pub fn is_subtype_name_of(&self, type_name: &str, base: EntityTypeName) -> bool {
        type_name
            .parse::<EntityTypeName>()
            .map_or(false, |parsed| self.is_subtype_of(parsed, base))
    }

    /// `base` and every type that inherits from it
    pub fn subtypes_of(&self, base: EntityTypeName) -> Vec<EntityTypeName> {
        let mut subtypes: Vec<EntityTypeName> = EntityTypeName::ALL
            .iter()
            .copied()
            .filter(|candidate| self.is_subtype_of(*candidate, base))
            .collect();
        subtypes.sort();
        subtypes
    }

    /// Resolve the caller-supplied subtype name against the handler's base type
    pub fn resolve_entity_subtype(
        &self,
        supplied: Option<&str>,
        base: EntityTypeName,
        parameter: &str,
        method: &str,
    ) -> MetadataResult<EntityTypeName> {
        let supplied = match supplied.map(str::trim) {
            None | Some("") => return Ok(base),
            Some(name) => name,
        };

        let resolved = self.lookup_entity_type(supplied).map_err(|error| {
            MetadataError::invalid_parameter(parameter, method, error.to_string())
        })?;

        if !self.is_subtype_of(resolved, base) {
            return Err(MetadataError::invalid_parameter(
                parameter,
                method,
                format!("type {supplied} is not a subtype of {base}"),
            ));
        }
        Ok(resolved)
    }

    pub fn validate_classification(
        &self,
        classification: ClassificationTypeName,
        entity_type_name: &str,
        method: &str,
    ) -> MetadataResult<()> {
        let definition = self.classifications.get(&classification).ok_or_else(|| {
            MetadataError::invalid_parameter(
                "classificationName",
                method,
                format!("classification {classification} is not known"),
            )
        })?;

        if definition.status != TypeStatus::Active {
            return Err(MetadataError::invalid_parameter(
                "classificationName",
                method,
                format!("classification {classification} is not active"),
            ));
        }

        if !self.is_subtype_name_of(entity_type_name, definition.valid_for) {
            return Err(MetadataError::invalid_parameter(
                "classificationName",
                method,
                format!("classification {classification} is not valid for {entity_type_name}"),
            ));
        }
        Ok(())
    }

    /// Repository-level end type check, so a rejection is a server fault
    pub fn validate_relationship_ends(
        &self,
        relationship: RelationshipTypeName,
        end1_type_name: &str,
        end2_type_name: &str,
        method: &str,
    ) -> MetadataResult<()> {
        let definition = self.relationships.get(&relationship).ok_or_else(|| {
            MetadataError::property_server(method, format!("relationship {relationship} is not defined"))
        })?;

        if definition.status != TypeStatus::Active {
            return Err(MetadataError::property_server(
                method,
                format!("relationship {relationship} is not active"),
            ));
        }

        if !self.is_subtype_name_of(end1_type_name, definition.end1)
            || !self.is_subtype_name_of(end2_type_name, definition.end2)
        {
            return Err(MetadataError::property_server(
                method,
                format!(
                    "relationship {relationship} cannot link {end1_type_name} to {end2_type_name}; expected {} to {}",
                    definition.end1, definition.end2
                ),
            ));
        }
        Ok(())
    }

    pub fn anchor_rule(&self, relationship: RelationshipTypeName) -> Option<AnchorRule> {
        self.relationships
            .get(&relationship)
            .and_then(|definition| definition.anchor_rule)
    }

    /// Relationship types whose second end is anchored or scoped by the first
    pub fn anchoring_relationships(&self) -> Vec<RelationshipTypeName> {
        let mut anchoring: Vec<RelationshipTypeName> = self
            .relationships
            .iter()
            .filter(|(_, definition)| definition.anchor_rule.is_some())
            .map(|(name, _)| *name)
            .collect();
        anchoring.sort();
        anchoring
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::open_metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_walk() {
        let registry = TypeRegistry::open_metadata();
        assert!(registry.is_subtype_of(EntityTypeName::Database, EntityTypeName::Asset));
        assert!(registry.is_subtype_of(EntityTypeName::Database, EntityTypeName::Referenceable));
        assert!(!registry.is_subtype_of(EntityTypeName::GlossaryTerm, EntityTypeName::Asset));
        assert!(registry
            .subtypes_of(EntityTypeName::GlossaryTerm)
            .contains(&EntityTypeName::ControlledGlossaryTerm));
    }

    #[test]
    fn test_resolve_entity_subtype() {
        let registry = TypeRegistry::open_metadata();
        let method = "create_glossary_term";

        assert_eq!(
            registry
                .resolve_entity_subtype(None, EntityTypeName::GlossaryTerm, "typeName", method)
                .unwrap(),
            EntityTypeName::GlossaryTerm
        );
        assert_eq!(
            registry
                .resolve_entity_subtype(Some(""), EntityTypeName::GlossaryTerm, "typeName", method)
                .unwrap(),
            EntityTypeName::GlossaryTerm
        );
        assert_eq!(
            registry
                .resolve_entity_subtype(
                    Some("ControlledGlossaryTerm"),
                    EntityTypeName::GlossaryTerm,
                    "typeName",
                    method
                )
                .unwrap(),
            EntityTypeName::ControlledGlossaryTerm
        );

        let unknown = registry
            .resolve_entity_subtype(Some("Gadget"), EntityTypeName::GlossaryTerm, "typeName", method)
            .unwrap_err();
        assert!(unknown.is_invalid_parameter());

        let wrong_branch = registry
            .resolve_entity_subtype(Some("Database"), EntityTypeName::GlossaryTerm, "typeName", method)
            .unwrap_err();
        assert!(wrong_branch.is_invalid_parameter());
    }

    #[test]
    fn test_deprecated_type_is_rejected() {
        let mut registry = TypeRegistry::open_metadata();
        registry.deprecate_entity_type(EntityTypeName::ControlledGlossaryTerm);

        assert_eq!(
            registry.lookup_entity_type("ControlledGlossaryTerm"),
            Err(TypeLookupError::Inactive("ControlledGlossaryTerm".to_string()))
        );
        let error = registry
            .resolve_entity_subtype(
                Some("ControlledGlossaryTerm"),
                EntityTypeName::GlossaryTerm,
                "typeName",
                "create_glossary_term",
            )
            .unwrap_err();
        assert!(error.is_invalid_parameter());
    }

    #[test]
    fn test_relationship_end_mismatch_is_server_error() {
        let registry = TypeRegistry::open_metadata();
        assert!(registry
            .validate_relationship_ends(RelationshipTypeName::TermAnchor, "Glossary", "GlossaryTerm", "m")
            .is_ok());

        let error = registry
            .validate_relationship_ends(RelationshipTypeName::TermAnchor, "Database", "GlossaryTerm", "m")
            .unwrap_err();
        assert!(error.is_property_server());
    }

    #[test]
    fn test_classification_validity() {
        let registry = TypeRegistry::open_metadata();
        assert!(registry
            .validate_classification(ClassificationTypeName::PrimaryKey, "RelationalColumn", "m")
            .is_ok());
        assert!(registry
            .validate_classification(ClassificationTypeName::SpineObject, "RelationalColumn", "m")
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn test_anchor_rules() {
        let registry = TypeRegistry::open_metadata();
        assert_eq!(
            registry.anchor_rule(RelationshipTypeName::TermAnchor),
            Some(AnchorRule::AnchorsWithScope)
        );
        assert_eq!(
            registry.anchor_rule(RelationshipTypeName::DataContentForDataSet),
            Some(AnchorRule::ScopesOnly)
        );
        assert_eq!(registry.anchor_rule(RelationshipTypeName::ForeignKey), None);
        assert!("TermTYPEDBYRelationship"
            .parse::<RelationshipTypeName>()
            .unwrap()
            .is_term_to_term());
    }
}
