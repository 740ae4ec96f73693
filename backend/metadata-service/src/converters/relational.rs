use super::{owning_guid, BeanConverter};
use crate::domain::{
    DatabaseColumnElement, DatabaseColumnProperties, DatabaseElement, DatabaseProperties,
    DatabaseSchemaElement, DatabaseSchemaProperties, DatabaseTableElement,
    DatabaseTableProperties, ElementHeader, Entity, PrimaryKeyProperties, Relationship,
};
use crate::types::{ClassificationTypeName, EntityTypeName};
use error_types::MetadataResult;

/// Vendor properties live on a facet and are filled in by the handler
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseConverter;

impl BeanConverter for DatabaseConverter {
    type Bean = DatabaseElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::Database;

    fn build(&self, entity: &Entity, _: Option<&Relationship>, _: &str) -> MetadataResult<DatabaseElement> {
        Ok(DatabaseElement {
            header: ElementHeader::from(entity),
            properties: DatabaseProperties::from_instance_properties(&entity.properties),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseSchemaConverter;

impl BeanConverter for DatabaseSchemaConverter {
    type Bean = DatabaseSchemaElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::DeployedDatabaseSchema;

    fn build(
        &self,
        entity: &Entity,
        _: Option<&Relationship>,
        _: &str,
    ) -> MetadataResult<DatabaseSchemaElement> {
        Ok(DatabaseSchemaElement {
            header: ElementHeader::from(entity),
            properties: DatabaseSchemaProperties::from_instance_properties(&entity.properties),
            // The schema is self-anchored and scoped by its database
            database_guid: entity.anchor_scope_guid(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseTableConverter;

impl BeanConverter for DatabaseTableConverter {
    type Bean = DatabaseTableElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::RelationalTable;

    fn build(
        &self,
        entity: &Entity,
        _: Option<&Relationship>,
        _: &str,
    ) -> MetadataResult<DatabaseTableElement> {
        Ok(DatabaseTableElement {
            header: ElementHeader::from(entity),
            properties: DatabaseTableProperties::from_instance_properties(&entity.properties),
            database_schema_guid: owning_guid(entity),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseColumnConverter;

impl BeanConverter for DatabaseColumnConverter {
    type Bean = DatabaseColumnElement;
    const BASE_TYPE: EntityTypeName = EntityTypeName::RelationalColumn;

    fn build(
        &self,
        entity: &Entity,
        _: Option<&Relationship>,
        _: &str,
    ) -> MetadataResult<DatabaseColumnElement> {
        let embedded_type = entity
            .classification(ClassificationTypeName::TypeEmbeddedAttribute.as_str())
            .map(|classification| &classification.properties);
        let primary_key = entity
            .classification(ClassificationTypeName::PrimaryKey.as_str())
            .map(|classification| {
                PrimaryKeyProperties::from_instance_properties(&classification.properties)
            });

        Ok(DatabaseColumnElement {
            header: ElementHeader::from(entity),
            properties: DatabaseColumnProperties::from_parts(&entity.properties, embedded_type),
            primary_key,
            database_schema_guid: owning_guid(entity),
        })
    }
}
