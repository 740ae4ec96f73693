//! Relational databases, their schemas, tables and columns, and the keys
//! between columns
//!
//! A database schema is stored as a DeployedDatabaseSchema asset with a
//! RelationalDBSchemaType attached through AssetSchemaType. Tables hang off
//! the schema type through AttributeForSchema and columns off tables through
//! NestedSchemaAttribute. Tables and columns carry their own schema type as
//! a TypeEmbeddedAttribute classification rather than a separate entity.

use super::generic::{GenericHandler, LinkEnd, SearchOptions, NAME_PROPERTIES};
use super::property_facet::PropertyFacetHandler;
use crate::converters::{
    BeanConverter, DatabaseColumnConverter, DatabaseConverter, DatabaseSchemaConverter,
    DatabaseTableConverter,
};
use crate::domain::relational::PRIMITIVE_SCHEMA_TYPE;
use crate::domain::{
    property_names, DatabaseColumnElement, DatabaseColumnProperties, DatabaseElement,
    DatabaseProperties, DatabaseSchemaElement, DatabaseSchemaProperties, DatabaseTableElement,
    DatabaseTableProperties, Entity, ForeignKeyElement, ForeignKeyProperties, Guid,
    InstanceProperties, KeyPattern, PrimaryKeyProperties, TemplateProperties,
};
use crate::types::{ClassificationTypeName, EntityTypeName, RelationshipTypeName};
use chrono::{DateTime, Utc};
use error_types::{MetadataError, MetadataResult};
use tracing::debug;

const DATABASE_GUID: &str = "databaseGUID";
const DATABASE_MANAGER_GUID: &str = "databaseManagerGUID";
const SCHEMA_GUID: &str = "databaseSchemaGUID";
const TABLE_GUID: &str = "databaseTableGUID";
const COLUMN_GUID: &str = "databaseColumnGUID";
const PRIMARY_KEY_COLUMN_GUID: &str = "primaryKeyColumnGUID";
const FOREIGN_KEY_COLUMN_GUID: &str = "foreignKeyColumnGUID";

const DATABASE_SEARCH_PROPERTIES: &[&str] = &[
    property_names::DATABASE_TYPE,
    property_names::DATABASE_VERSION,
    property_names::DATABASE_INSTANCE,
    property_names::DATABASE_IMPORTED_FROM,
];

const COLUMN_SEARCH_PROPERTIES: &[&str] = &[property_names::NATIVE_CLASS];

/// Qualified name of the schema type created alongside a schema asset
fn schema_type_qualified_name(schema_qualified_name: &str) -> String {
    format!("{schema_qualified_name}::{}", EntityTypeName::RelationalDBSchemaType)
}

#[derive(Clone)]
pub struct RelationalDataHandler {
    generic: GenericHandler,
    facets: PropertyFacetHandler,
}

impl RelationalDataHandler {
    pub fn new(generic: &GenericHandler) -> Self {
        Self {
            generic: generic.named("relational_data"),
            facets: PropertyFacetHandler::new(generic),
        }
    }

    fn manager_end(guid: Guid) -> LinkEnd {
        LinkEnd::new(guid, DATABASE_MANAGER_GUID, EntityTypeName::DatabaseManager)
    }

    async fn link_manager(
        &self,
        user_id: &str,
        database_manager_guid: Option<Guid>,
        asset_guid: Guid,
        asset_type: EntityTypeName,
        method: &str,
    ) -> MetadataResult<()> {
        if let Some(manager_guid) = database_manager_guid {
            self.generic
                .link_elements(
                    user_id,
                    Self::manager_end(manager_guid),
                    LinkEnd::new(asset_guid, "assetGUID", asset_type),
                    RelationshipTypeName::ServerAssetUse,
                    InstanceProperties::new(),
                    method,
                )
                .await?;
        }
        Ok(())
    }

    /// Replace the asset's zones with `zones`
    async fn set_zones(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        zones: &[String],
        method: &str,
    ) -> MetadataResult<()> {
        let properties = InstanceProperties::new().with_string_array(property_names::ZONE_MEMBERSHIP, zones);
        if properties.is_empty() {
            debug!(%guid, "No zones configured; membership left unchanged");
            return Ok(());
        }
        self.generic
            .update_bean(user_id, guid, parameter, expected_type, properties, true, method)
            .await
    }

    async fn database_bean(&self, user_id: &str, entity: &Entity, method: &str) -> MetadataResult<DatabaseElement> {
        let mut bean = DatabaseConverter.new_bean(self.generic.registry(), entity, None, method)?;
        bean.properties.vendor_properties = self
            .facets
            .get_vendor_properties(user_id, entity.guid, method)
            .await?;
        Ok(bean)
    }

    async fn database_beans(
        &self,
        user_id: &str,
        entities: &[Entity],
        method: &str,
    ) -> MetadataResult<Vec<DatabaseElement>> {
        let mut beans = Vec::with_capacity(entities.len());
        for entity in entities {
            beans.push(self.database_bean(user_id, entity, method).await?);
        }
        Ok(beans)
    }

    fn beans<C: BeanConverter>(&self, converter: C, entities: &[Entity], method: &str) -> MetadataResult<Vec<C::Bean>> {
        entities
            .iter()
            .map(|entity| converter.new_bean(self.generic.registry(), entity, None, method))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    async fn related(
        &self,
        user_id: &str,
        starting_guid: Guid,
        parameter: &str,
        starting_type: EntityTypeName,
        relationship: RelationshipTypeName,
        related_type: EntityTypeName,
        options: SearchOptions<'_>,
        method: &str,
    ) -> MetadataResult<Vec<Entity>> {
        Ok(self
            .generic
            .get_related_entities(
                user_id,
                starting_guid,
                parameter,
                starting_type,
                &[relationship],
                related_type,
                options,
                method,
            )
            .await?
            .into_iter()
            .map(|(_, entity)| entity)
            .collect())
    }

    // ------------------------------------------------------------------
    // Databases
    // ------------------------------------------------------------------

    pub async fn create_database(
        &self,
        user_id: &str,
        database_manager_guid: Option<Guid>,
        properties: &DatabaseProperties,
        supplied_type_name: Option<&str>,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database";
        self.generic
            .observe(METHOD, async {
                let type_name = self.generic.registry().resolve_entity_subtype(
                    supplied_type_name,
                    EntityTypeName::Database,
                    "suppliedTypeName",
                    METHOD,
                )?;
                if let Some(manager_guid) = database_manager_guid {
                    self.generic
                        .get_entity(user_id, manager_guid, DATABASE_MANAGER_GUID, EntityTypeName::DatabaseManager, None, METHOD)
                        .await?;
                }

                let database_guid = self
                    .generic
                    .create_bean(user_id, type_name, properties.to_instance_properties(), None, None, METHOD)
                    .await?;

                if let (Some(qualified_name), false) =
                    (properties.qualified_name.as_deref(), properties.vendor_properties.is_empty())
                {
                    self.facets
                        .set_vendor_properties(user_id, database_guid, qualified_name, &properties.vendor_properties, METHOD)
                        .await?;
                }
                self.link_manager(user_id, database_manager_guid, database_guid, EntityTypeName::Database, METHOD)
                    .await?;
                Ok(database_guid)
            })
            .await
    }

    pub async fn create_database_from_template(
        &self,
        user_id: &str,
        database_manager_guid: Option<Guid>,
        template_guid: Guid,
        template_properties: &TemplateProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_from_template";
        self.generic
            .observe(METHOD, async {
                let database_guid = self
                    .generic
                    .create_bean_from_template(
                        user_id,
                        template_guid,
                        EntityTypeName::Database,
                        template_properties.to_instance_properties(),
                        None,
                        METHOD,
                    )
                    .await?;

                let vendor_properties = self
                    .facets
                    .get_vendor_properties(user_id, template_guid, METHOD)
                    .await?;
                if let (Some(qualified_name), false) =
                    (template_properties.qualified_name.as_deref(), vendor_properties.is_empty())
                {
                    self.facets
                        .set_vendor_properties(user_id, database_guid, qualified_name, &vendor_properties, METHOD)
                        .await?;
                }
                self.link_manager(user_id, database_manager_guid, database_guid, EntityTypeName::Database, METHOD)
                    .await?;
                Ok(database_guid)
            })
            .await
    }

    /// Vendor properties are replaced when supplied, and on a replace update
    pub async fn update_database(
        &self,
        user_id: &str,
        database_guid: Guid,
        properties: &DatabaseProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_database";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        database_guid,
                        DATABASE_GUID,
                        EntityTypeName::Database,
                        properties.to_instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await?;

                if !is_merge_update || !properties.vendor_properties.is_empty() {
                    let entity = self
                        .generic
                        .get_entity(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, None, METHOD)
                        .await?;
                    let qualified_name = entity.qualified_name().unwrap_or_default().to_string();
                    self.facets
                        .set_vendor_properties(user_id, database_guid, &qualified_name, &properties.vendor_properties, METHOD)
                        .await?;
                }
                Ok(())
            })
            .await
    }

    pub async fn publish_database(&self, user_id: &str, database_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "publish_database";
        self.generic
            .observe(METHOD, async {
                let zones = self.generic.zones().publish_zones.clone();
                self.set_zones(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, &zones, METHOD)
                    .await
            })
            .await
    }

    pub async fn withdraw_database(&self, user_id: &str, database_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "withdraw_database";
        self.generic
            .observe(METHOD, async {
                let zones = self.generic.zones().default_zones.clone();
                self.set_zones(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, &zones, METHOD)
                    .await
            })
            .await
    }

    /// Removes the database with its schemas, tables and columns
    pub async fn remove_database(&self, user_id: &str, database_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_database";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, true, METHOD)
                    .await
            })
            .await
    }

    pub async fn find_databases(
        &self,
        user_id: &str,
        search_string: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseElement>> {
        const METHOD: &str = "find_databases";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_value(
                        user_id,
                        search_string,
                        "searchString",
                        DATABASE_SEARCH_PROPERTIES,
                        EntityTypeName::Database,
                        options,
                        METHOD,
                    )
                    .await?;
                self.database_beans(user_id, &entities, METHOD).await
            })
            .await
    }

    pub async fn get_databases_by_name(
        &self,
        user_id: &str,
        name: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseElement>> {
        const METHOD: &str = "get_databases_by_name";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_name(user_id, name, "name", NAME_PROPERTIES, EntityTypeName::Database, options, METHOD)
                    .await?;
                self.database_beans(user_id, &entities, METHOD).await
            })
            .await
    }

    pub async fn get_databases_for_database_manager(
        &self,
        user_id: &str,
        database_manager_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseElement>> {
        const METHOD: &str = "get_databases_for_database_manager";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .related(
                        user_id,
                        database_manager_guid,
                        DATABASE_MANAGER_GUID,
                        EntityTypeName::DatabaseManager,
                        RelationshipTypeName::ServerAssetUse,
                        EntityTypeName::Database,
                        options,
                        METHOD,
                    )
                    .await?;
                self.database_beans(user_id, &entities, METHOD).await
            })
            .await
    }

    pub async fn get_database_by_guid(
        &self,
        user_id: &str,
        database_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<DatabaseElement> {
        const METHOD: &str = "get_database_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, effective_time, METHOD)
                    .await?;
                self.database_bean(user_id, &entity, METHOD).await
            })
            .await
    }

    pub async fn get_databases(&self, user_id: &str, options: SearchOptions<'_>) -> MetadataResult<Vec<DatabaseElement>> {
        const METHOD: &str = "get_databases";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .get_beans_by_type(user_id, EntityTypeName::Database, options, METHOD)
                    .await?;
                self.database_beans(user_id, &entities, METHOD).await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Database schemas
    // ------------------------------------------------------------------

    /// Link the schema to its database and give it a fresh relational schema type
    async fn attach_schema(
        &self,
        user_id: &str,
        database_guid: Option<Guid>,
        schema_guid: Guid,
        schema_qualified_name: &str,
        method: &str,
    ) -> MetadataResult<()> {
        if let Some(database_guid) = database_guid {
            self.generic
                .link_elements(
                    user_id,
                    LinkEnd::new(database_guid, DATABASE_GUID, EntityTypeName::Database),
                    LinkEnd::new(schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema),
                    RelationshipTypeName::DataContentForDataSet,
                    InstanceProperties::new(),
                    method,
                )
                .await?;
        }

        let schema_type_guid = self
            .generic
            .create_bean(
                user_id,
                EntityTypeName::RelationalDBSchemaType,
                InstanceProperties::new().with_string(
                    property_names::QUALIFIED_NAME,
                    Some(&schema_type_qualified_name(schema_qualified_name)),
                ),
                None,
                database_guid,
                method,
            )
            .await?;

        self.generic
            .link_elements(
                user_id,
                LinkEnd::new(schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema),
                LinkEnd::new(schema_type_guid, "schemaTypeGUID", EntityTypeName::RelationalDBSchemaType),
                RelationshipTypeName::AssetSchemaType,
                InstanceProperties::new(),
                method,
            )
            .await?;
        Ok(())
    }

    /// Schema type attached to a schema asset
    async fn schema_type_for(&self, user_id: &str, schema_guid: Guid, method: &str) -> MetadataResult<Guid> {
        self.related(
            user_id,
            schema_guid,
            SCHEMA_GUID,
            EntityTypeName::DeployedDatabaseSchema,
            RelationshipTypeName::AssetSchemaType,
            EntityTypeName::RelationalDBSchemaType,
            SearchOptions::paged(0, 1),
            method,
        )
        .await?
        .first()
        .map(|schema_type| schema_type.guid)
        .ok_or_else(|| {
            MetadataError::property_server(method, format!("database schema {schema_guid} has no schema type"))
        })
    }

    pub async fn create_database_schema(
        &self,
        user_id: &str,
        database_guid: Option<Guid>,
        properties: &DatabaseSchemaProperties,
        supplied_type_name: Option<&str>,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_schema";
        self.generic
            .observe(METHOD, async {
                let type_name = self.generic.registry().resolve_entity_subtype(
                    supplied_type_name,
                    EntityTypeName::DeployedDatabaseSchema,
                    "suppliedTypeName",
                    METHOD,
                )?;
                if let Some(database_guid) = database_guid {
                    self.generic
                        .get_entity(user_id, database_guid, DATABASE_GUID, EntityTypeName::Database, None, METHOD)
                        .await?;
                }

                let schema_guid = self
                    .generic
                    .create_bean(
                        user_id,
                        type_name,
                        properties.to_instance_properties(),
                        None,
                        database_guid,
                        METHOD,
                    )
                    .await?;

                let qualified_name = properties.qualified_name.clone().unwrap_or_default();
                self.attach_schema(user_id, database_guid, schema_guid, &qualified_name, METHOD)
                    .await?;
                Ok(schema_guid)
            })
            .await
    }

    pub async fn create_database_schema_from_template(
        &self,
        user_id: &str,
        database_guid: Option<Guid>,
        template_guid: Guid,
        template_properties: &TemplateProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_schema_from_template";
        self.generic
            .observe(METHOD, async {
                let schema_guid = self
                    .generic
                    .create_bean_from_template(
                        user_id,
                        template_guid,
                        EntityTypeName::DeployedDatabaseSchema,
                        template_properties.to_instance_properties(),
                        database_guid,
                        METHOD,
                    )
                    .await?;

                let qualified_name = template_properties.qualified_name.clone().unwrap_or_default();
                self.attach_schema(user_id, database_guid, schema_guid, &qualified_name, METHOD)
                    .await?;
                Ok(schema_guid)
            })
            .await
    }

    pub async fn update_database_schema(
        &self,
        user_id: &str,
        schema_guid: Guid,
        properties: &DatabaseSchemaProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_database_schema";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        schema_guid,
                        SCHEMA_GUID,
                        EntityTypeName::DeployedDatabaseSchema,
                        properties.to_instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn publish_database_schema(&self, user_id: &str, schema_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "publish_database_schema";
        self.generic
            .observe(METHOD, async {
                let zones = self.generic.zones().publish_zones.clone();
                self.set_zones(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, &zones, METHOD)
                    .await
            })
            .await
    }

    pub async fn withdraw_database_schema(&self, user_id: &str, schema_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "withdraw_database_schema";
        self.generic
            .observe(METHOD, async {
                let zones = self.generic.zones().default_zones.clone();
                self.set_zones(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, &zones, METHOD)
                    .await
            })
            .await
    }

    /// Removes the schema with its schema type, tables and columns
    pub async fn remove_database_schema(&self, user_id: &str, schema_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_database_schema";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, true, METHOD)
                    .await
            })
            .await
    }

    pub async fn find_database_schemas(
        &self,
        user_id: &str,
        search_string: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseSchemaElement>> {
        const METHOD: &str = "find_database_schemas";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_value(
                        user_id,
                        search_string,
                        "searchString",
                        &[],
                        EntityTypeName::DeployedDatabaseSchema,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseSchemaConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_schemas_by_name(
        &self,
        user_id: &str,
        name: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseSchemaElement>> {
        const METHOD: &str = "get_database_schemas_by_name";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_name(
                        user_id,
                        name,
                        "name",
                        NAME_PROPERTIES,
                        EntityTypeName::DeployedDatabaseSchema,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseSchemaConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_schemas_for_database(
        &self,
        user_id: &str,
        database_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseSchemaElement>> {
        const METHOD: &str = "get_schemas_for_database";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .related(
                        user_id,
                        database_guid,
                        DATABASE_GUID,
                        EntityTypeName::Database,
                        RelationshipTypeName::DataContentForDataSet,
                        EntityTypeName::DeployedDatabaseSchema,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseSchemaConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_schema_by_guid(
        &self,
        user_id: &str,
        schema_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<DatabaseSchemaElement> {
        const METHOD: &str = "get_database_schema_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, effective_time, METHOD)
                    .await?;
                DatabaseSchemaConverter.new_bean(self.generic.registry(), &entity, None, METHOD)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    async fn attach_table(&self, user_id: &str, schema_type_guid: Guid, table_guid: Guid, method: &str) -> MetadataResult<()> {
        self.generic
            .link_elements(
                user_id,
                LinkEnd::new(schema_type_guid, "schemaTypeGUID", EntityTypeName::RelationalDBSchemaType),
                LinkEnd::new(table_guid, TABLE_GUID, EntityTypeName::RelationalTable),
                RelationshipTypeName::AttributeForSchema,
                InstanceProperties::new(),
                method,
            )
            .await
            .map(|_| ())
    }

    #[allow(clippy::too_many_arguments)]
    async fn embed_type(
        &self,
        user_id: &str,
        guid: Guid,
        parameter: &str,
        expected_type: EntityTypeName,
        properties: InstanceProperties,
        is_merge_update: bool,
        method: &str,
    ) -> MetadataResult<()> {
        self.generic
            .set_classification(
                user_id,
                guid,
                parameter,
                expected_type,
                ClassificationTypeName::TypeEmbeddedAttribute,
                properties,
                is_merge_update,
                method,
            )
            .await
    }

    pub async fn create_database_table(
        &self,
        user_id: &str,
        schema_guid: Guid,
        properties: &DatabaseTableProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_table";
        self.generic
            .observe(METHOD, async {
                let schema = self
                    .generic
                    .get_entity(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, None, METHOD)
                    .await?;
                let schema_type_guid = self.schema_type_for(user_id, schema_guid, METHOD).await?;

                let table_guid = self
                    .generic
                    .create_bean(
                        user_id,
                        EntityTypeName::RelationalTable,
                        properties.to_instance_properties(),
                        None,
                        schema.anchor_scope_guid(),
                        METHOD,
                    )
                    .await?;

                self.embed_type(
                    user_id,
                    table_guid,
                    TABLE_GUID,
                    EntityTypeName::RelationalTable,
                    DatabaseTableProperties::embedded_type_properties(),
                    false,
                    METHOD,
                )
                .await?;
                self.attach_table(user_id, schema_type_guid, table_guid, METHOD).await?;
                Ok(table_guid)
            })
            .await
    }

    pub async fn create_database_table_from_template(
        &self,
        user_id: &str,
        schema_guid: Guid,
        template_guid: Guid,
        template_properties: &TemplateProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_table_from_template";
        self.generic
            .observe(METHOD, async {
                let schema = self
                    .generic
                    .get_entity(user_id, schema_guid, SCHEMA_GUID, EntityTypeName::DeployedDatabaseSchema, None, METHOD)
                    .await?;
                let schema_type_guid = self.schema_type_for(user_id, schema_guid, METHOD).await?;

                let table_guid = self
                    .generic
                    .create_bean_from_template(
                        user_id,
                        template_guid,
                        EntityTypeName::RelationalTable,
                        template_properties.to_instance_properties(),
                        schema.anchor_scope_guid(),
                        METHOD,
                    )
                    .await?;

                // The copied classification is kept; only a missing one is filled in
                self.embed_type(
                    user_id,
                    table_guid,
                    TABLE_GUID,
                    EntityTypeName::RelationalTable,
                    DatabaseTableProperties::embedded_type_properties(),
                    true,
                    METHOD,
                )
                .await?;
                self.attach_table(user_id, schema_type_guid, table_guid, METHOD).await?;
                Ok(table_guid)
            })
            .await
    }

    pub async fn update_database_table(
        &self,
        user_id: &str,
        table_guid: Guid,
        properties: &DatabaseTableProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_database_table";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        table_guid,
                        TABLE_GUID,
                        EntityTypeName::RelationalTable,
                        properties.to_instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    /// Removes the table with its columns
    pub async fn remove_database_table(&self, user_id: &str, table_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_database_table";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, table_guid, TABLE_GUID, EntityTypeName::RelationalTable, true, METHOD)
                    .await
            })
            .await
    }

    pub async fn find_database_tables(
        &self,
        user_id: &str,
        search_string: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseTableElement>> {
        const METHOD: &str = "find_database_tables";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_value(user_id, search_string, "searchString", &[], EntityTypeName::RelationalTable, options, METHOD)
                    .await?;
                self.beans(DatabaseTableConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_tables_by_name(
        &self,
        user_id: &str,
        name: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseTableElement>> {
        const METHOD: &str = "get_database_tables_by_name";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_name(user_id, name, "name", NAME_PROPERTIES, EntityTypeName::RelationalTable, options, METHOD)
                    .await?;
                self.beans(DatabaseTableConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_tables_for_database_schema(
        &self,
        user_id: &str,
        schema_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseTableElement>> {
        const METHOD: &str = "get_tables_for_database_schema";
        self.generic
            .observe(METHOD, async {
                let schema_type_guid = self.schema_type_for(user_id, schema_guid, METHOD).await?;
                let entities = self
                    .related(
                        user_id,
                        schema_type_guid,
                        "schemaTypeGUID",
                        EntityTypeName::RelationalDBSchemaType,
                        RelationshipTypeName::AttributeForSchema,
                        EntityTypeName::RelationalTable,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseTableConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_table_by_guid(
        &self,
        user_id: &str,
        table_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<DatabaseTableElement> {
        const METHOD: &str = "get_database_table_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(user_id, table_guid, TABLE_GUID, EntityTypeName::RelationalTable, effective_time, METHOD)
                    .await?;
                DatabaseTableConverter.new_bean(self.generic.registry(), &entity, None, METHOD)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------

    async fn attach_column(&self, user_id: &str, table_guid: Guid, column_guid: Guid, method: &str) -> MetadataResult<()> {
        self.generic
            .link_elements(
                user_id,
                LinkEnd::new(table_guid, TABLE_GUID, EntityTypeName::RelationalTable),
                LinkEnd::new(column_guid, COLUMN_GUID, EntityTypeName::RelationalColumn),
                RelationshipTypeName::NestedSchemaAttribute,
                InstanceProperties::new(),
                method,
            )
            .await
            .map(|_| ())
    }

    async fn set_formula(
        &self,
        user_id: &str,
        column_guid: Guid,
        formula: Option<&str>,
        method: &str,
    ) -> MetadataResult<()> {
        match formula {
            Some(formula) => {
                self.generic
                    .set_classification(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        ClassificationTypeName::CalculatedValue,
                        InstanceProperties::new().with_string(property_names::FORMULA, Some(formula)),
                        false,
                        method,
                    )
                    .await
            }
            None => {
                self.generic
                    .clear_classification(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        ClassificationTypeName::CalculatedValue,
                        method,
                    )
                    .await
            }
        }
    }

    pub async fn create_database_column(
        &self,
        user_id: &str,
        table_guid: Guid,
        properties: &DatabaseColumnProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_column";
        self.generic
            .observe(METHOD, async {
                let table = self
                    .generic
                    .get_entity(user_id, table_guid, TABLE_GUID, EntityTypeName::RelationalTable, None, METHOD)
                    .await?;

                let column_guid = self
                    .generic
                    .create_bean(
                        user_id,
                        EntityTypeName::RelationalColumn,
                        properties.to_instance_properties(),
                        None,
                        table.anchor_scope_guid(),
                        METHOD,
                    )
                    .await?;

                self.embed_type(
                    user_id,
                    column_guid,
                    COLUMN_GUID,
                    EntityTypeName::RelationalColumn,
                    properties.embedded_type_properties(),
                    false,
                    METHOD,
                )
                .await?;
                if properties.formula.is_some() {
                    self.set_formula(user_id, column_guid, properties.formula.as_deref(), METHOD)
                        .await?;
                }
                self.attach_column(user_id, table_guid, column_guid, METHOD).await?;
                Ok(column_guid)
            })
            .await
    }

    /// The template's embedded schema type must name a known, active type
    pub async fn create_database_column_from_template(
        &self,
        user_id: &str,
        table_guid: Guid,
        template_guid: Guid,
        template_properties: &TemplateProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "create_database_column_from_template";
        self.generic
            .observe(METHOD, async {
                let table = self
                    .generic
                    .get_entity(user_id, table_guid, TABLE_GUID, EntityTypeName::RelationalTable, None, METHOD)
                    .await?;
                let template = self
                    .generic
                    .get_entity(user_id, template_guid, "templateGUID", EntityTypeName::RelationalColumn, None, METHOD)
                    .await?;

                let embedded_type = template
                    .classification(ClassificationTypeName::TypeEmbeddedAttribute.as_str())
                    .and_then(|classification| classification.properties.string(property_names::SCHEMA_TYPE_NAME))
                    .map(str::to_string);
                if let Some(schema_type_name) = embedded_type.as_deref() {
                    self.generic
                        .registry()
                        .lookup_entity_type(schema_type_name)
                        .map_err(|error| MetadataError::invalid_parameter("templateGUID", METHOD, error.to_string()))?;
                }

                let column_guid = self
                    .generic
                    .create_bean_from_template(
                        user_id,
                        template_guid,
                        EntityTypeName::RelationalColumn,
                        template_properties.to_instance_properties(),
                        table.anchor_scope_guid(),
                        METHOD,
                    )
                    .await?;

                if embedded_type.is_none() {
                    self.embed_type(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        InstanceProperties::new().with_string(property_names::SCHEMA_TYPE_NAME, Some(PRIMITIVE_SCHEMA_TYPE)),
                        false,
                        METHOD,
                    )
                    .await?;
                }
                self.attach_column(user_id, table_guid, column_guid, METHOD).await?;
                Ok(column_guid)
            })
            .await
    }

    /// A merge only touches the embedded type when type fields are supplied
    pub async fn update_database_column(
        &self,
        user_id: &str,
        column_guid: Guid,
        properties: &DatabaseColumnProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_database_column";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .update_bean(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        properties.to_instance_properties(),
                        is_merge_update,
                        METHOD,
                    )
                    .await?;

                if !is_merge_update {
                    self.embed_type(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        properties.embedded_type_properties(),
                        false,
                        METHOD,
                    )
                    .await?;
                    return self
                        .set_formula(user_id, column_guid, properties.formula.as_deref(), METHOD)
                        .await;
                }

                if properties.has_embedded_type_fields() {
                    let mut embedded = properties.embedded_type_properties();
                    if properties.formula.is_none() {
                        // Keep a derived type derived when only other fields change
                        embedded = embedded.without(property_names::SCHEMA_TYPE_NAME);
                    }
                    self.embed_type(user_id, column_guid, COLUMN_GUID, EntityTypeName::RelationalColumn, embedded, true, METHOD)
                        .await?;
                }
                if properties.formula.is_some() {
                    self.set_formula(user_id, column_guid, properties.formula.as_deref(), METHOD)
                        .await?;
                }
                Ok(())
            })
            .await
    }

    pub async fn remove_database_column(&self, user_id: &str, column_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_database_column";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .delete_bean(user_id, column_guid, COLUMN_GUID, EntityTypeName::RelationalColumn, true, METHOD)
                    .await
            })
            .await
    }

    pub async fn find_database_columns(
        &self,
        user_id: &str,
        search_string: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseColumnElement>> {
        const METHOD: &str = "find_database_columns";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_value(
                        user_id,
                        search_string,
                        "searchString",
                        COLUMN_SEARCH_PROPERTIES,
                        EntityTypeName::RelationalColumn,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseColumnConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_columns_by_name(
        &self,
        user_id: &str,
        name: &str,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseColumnElement>> {
        const METHOD: &str = "get_database_columns_by_name";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .generic
                    .find_beans_by_name(user_id, name, "name", NAME_PROPERTIES, EntityTypeName::RelationalColumn, options, METHOD)
                    .await?;
                self.beans(DatabaseColumnConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_columns_for_database_table(
        &self,
        user_id: &str,
        table_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<DatabaseColumnElement>> {
        const METHOD: &str = "get_columns_for_database_table";
        self.generic
            .observe(METHOD, async {
                let entities = self
                    .related(
                        user_id,
                        table_guid,
                        TABLE_GUID,
                        EntityTypeName::RelationalTable,
                        RelationshipTypeName::NestedSchemaAttribute,
                        EntityTypeName::RelationalColumn,
                        options,
                        METHOD,
                    )
                    .await?;
                self.beans(DatabaseColumnConverter, &entities, METHOD)
            })
            .await
    }

    pub async fn get_database_column_by_guid(
        &self,
        user_id: &str,
        column_guid: Guid,
        effective_time: Option<DateTime<Utc>>,
    ) -> MetadataResult<DatabaseColumnElement> {
        const METHOD: &str = "get_database_column_by_guid";
        self.generic
            .observe(METHOD, async {
                let entity = self
                    .generic
                    .get_entity(user_id, column_guid, COLUMN_GUID, EntityTypeName::RelationalColumn, effective_time, METHOD)
                    .await?;
                DatabaseColumnConverter.new_bean(self.generic.registry(), &entity, None, METHOD)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// A missing key pattern defaults to a local key
    pub async fn set_primary_key_on_column(
        &self,
        user_id: &str,
        column_guid: Guid,
        name: Option<&str>,
        key_pattern: Option<KeyPattern>,
    ) -> MetadataResult<()> {
        const METHOD: &str = "set_primary_key_on_column";
        self.generic
            .observe(METHOD, async {
                let properties = PrimaryKeyProperties {
                    name: name.map(str::to_string),
                    key_pattern: key_pattern.unwrap_or(KeyPattern::LocalKey),
                };
                self.generic
                    .set_classification(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        ClassificationTypeName::PrimaryKey,
                        properties.to_instance_properties(),
                        false,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn remove_primary_key_from_column(&self, user_id: &str, column_guid: Guid) -> MetadataResult<()> {
        const METHOD: &str = "remove_primary_key_from_column";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .clear_classification(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        ClassificationTypeName::PrimaryKey,
                        METHOD,
                    )
                    .await
            })
            .await
    }

    fn key_ends(primary_key_column_guid: Guid, foreign_key_column_guid: Guid) -> (LinkEnd, LinkEnd) {
        (
            LinkEnd::new(primary_key_column_guid, PRIMARY_KEY_COLUMN_GUID, EntityTypeName::RelationalColumn),
            LinkEnd::new(foreign_key_column_guid, FOREIGN_KEY_COLUMN_GUID, EntityTypeName::RelationalColumn),
        )
    }

    pub async fn add_foreign_key_relationship(
        &self,
        user_id: &str,
        primary_key_column_guid: Guid,
        foreign_key_column_guid: Guid,
        properties: &ForeignKeyProperties,
    ) -> MetadataResult<Guid> {
        const METHOD: &str = "add_foreign_key_relationship";
        self.generic
            .observe(METHOD, async {
                let (primary, foreign) = Self::key_ends(primary_key_column_guid, foreign_key_column_guid);
                self.generic
                    .link_elements(
                        user_id,
                        primary,
                        foreign,
                        RelationshipTypeName::ForeignKey,
                        properties.to_instance_properties(),
                        METHOD,
                    )
                    .await
            })
            .await
    }

    pub async fn update_foreign_key_relationship(
        &self,
        user_id: &str,
        primary_key_column_guid: Guid,
        foreign_key_column_guid: Guid,
        properties: &ForeignKeyProperties,
        is_merge_update: bool,
    ) -> MetadataResult<()> {
        const METHOD: &str = "update_foreign_key_relationship";
        self.generic
            .observe(METHOD, async {
                self.generic
                    .get_entity_for_update(
                        user_id,
                        foreign_key_column_guid,
                        FOREIGN_KEY_COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        METHOD,
                    )
                    .await?;
                let existing = self
                    .generic
                    .find_relationships_between(primary_key_column_guid, foreign_key_column_guid, RelationshipTypeName::ForeignKey)
                    .await?;
                if existing.is_empty() {
                    return Err(MetadataError::invalid_parameter(
                        FOREIGN_KEY_COLUMN_GUID,
                        METHOD,
                        format!("no foreign key from {primary_key_column_guid} to {foreign_key_column_guid}"),
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

    pub async fn remove_foreign_key_relationship(
        &self,
        user_id: &str,
        primary_key_column_guid: Guid,
        foreign_key_column_guid: Guid,
    ) -> MetadataResult<()> {
        const METHOD: &str = "remove_foreign_key_relationship";
        self.generic
            .observe(METHOD, async {
                let (primary, foreign) = Self::key_ends(primary_key_column_guid, foreign_key_column_guid);
                self.generic
                    .unlink_elements(user_id, primary, foreign, RelationshipTypeName::ForeignKey, METHOD)
                    .await
                    .map(|_| ())
            })
            .await
    }

    /// Foreign keys in which the column takes part, at either end
    pub async fn get_foreign_keys_for_column(
        &self,
        user_id: &str,
        column_guid: Guid,
        options: SearchOptions<'_>,
    ) -> MetadataResult<Vec<ForeignKeyElement>> {
        const METHOD: &str = "get_foreign_keys_for_column";
        self.generic
            .observe(METHOD, async {
                let related = self
                    .generic
                    .get_related_entities(
                        user_id,
                        column_guid,
                        COLUMN_GUID,
                        EntityTypeName::RelationalColumn,
                        &[RelationshipTypeName::ForeignKey],
                        EntityTypeName::RelationalColumn,
                        options,
                        METHOD,
                    )
                    .await?;

                Ok(related
                    .into_iter()
                    .map(|(r, _)| ForeignKeyElement {
                        relationship_guid: r.guid,
                        primary_key_column_guid: r.end1_guid,
                        foreign_key_column_guid: r.end2_guid,
                        properties: ForeignKeyProperties::from_instance_properties(&r.properties),
                    })
                    .collect())
            })
            .await
    }
}
