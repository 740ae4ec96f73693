mod common;

use common::{Fixture, USER};
use metadata_service::domain::{
    property_names, DatabaseColumnProperties, DatabaseProperties, DatabaseSchemaProperties,
    DatabaseTableProperties, ForeignKeyProperties, Guid, InstanceProperties, KeyPattern,
    TemplateProperties,
};
use metadata_service::handlers::SearchOptions;
use metadata_service::types::{ClassificationTypeName, EntityTypeName};
use std::collections::BTreeMap;

struct Catalog {
    database: Guid,
    schema: Guid,
    table: Guid,
}

fn database(qualified_name: &str) -> DatabaseProperties {
    DatabaseProperties {
        qualified_name: Some(qualified_name.to_string()),
        display_name: Some(qualified_name.to_string()),
        database_type: Some("PostgreSQL".to_string()),
        database_version: Some("16".to_string()),
        ..Default::default()
    }
}

fn column(qualified_name: &str) -> DatabaseColumnProperties {
    DatabaseColumnProperties {
        qualified_name: Some(qualified_name.to_string()),
        display_name: Some(qualified_name.to_string()),
        data_type: Some("VARCHAR".to_string()),
        ..Default::default()
    }
}

async fn catalog(fixture: &Fixture) -> Catalog {
    let manager = fixture.create_database_manager("Server::Postgres").await;
    let database = fixture
        .relational
        .create_database(USER, Some(manager), &database("Database::Sales"), None)
        .await
        .unwrap();
    let schema = fixture
        .relational
        .create_database_schema(
            USER,
            Some(database),
            &DatabaseSchemaProperties {
                qualified_name: Some("Schema::Sales.public".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let table = fixture
        .relational
        .create_database_table(
            USER,
            schema,
            &DatabaseTableProperties {
                qualified_name: Some("Table::Sales.public.orders".to_string()),
                display_name: Some("orders".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    Catalog { database, schema, table }
}

#[tokio::test]
async fn test_catalog_chain_is_navigable() {
    let fixture = Fixture::new();
    let manager = fixture.create_database_manager("Server::Idle").await;
    let catalog = catalog(&fixture).await;
    let column_guid = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.id"))
        .await
        .unwrap();

    let databases = fixture
        .relational
        .get_databases_by_name(USER, "Database::Sales", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].properties.database_type.as_deref(), Some("PostgreSQL"));

    let unrelated = fixture
        .relational
        .get_databases_for_database_manager(USER, manager, SearchOptions::default())
        .await
        .unwrap();
    assert!(unrelated.is_empty());

    let schemas = fixture
        .relational
        .get_schemas_for_database(USER, catalog.database, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].header.guid, catalog.schema);
    assert_eq!(schemas[0].database_guid, Some(catalog.database));

    let tables = fixture
        .relational
        .get_tables_for_database_schema(USER, catalog.schema, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].header.guid, catalog.table);
    assert_eq!(tables[0].database_schema_guid, Some(catalog.schema));

    let columns = fixture
        .relational
        .get_columns_for_database_table(USER, catalog.table, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].header.guid, column_guid);
    assert_eq!(columns[0].properties.data_type.as_deref(), Some("VARCHAR"));
    assert_eq!(columns[0].database_schema_guid, Some(catalog.schema));

    let anchor = columns[0].header.anchor.clone().expect("column is anchored");
    assert_eq!(anchor.anchor_guid, catalog.schema);
    assert_eq!(anchor.anchor_scope_guid, Some(catalog.database));
}

#[tokio::test]
async fn test_databases_are_listed_per_manager() {
    let fixture = Fixture::new();
    let manager = fixture.create_database_manager("Server::Postgres").await;
    let inventory = fixture
        .relational
        .create_database(USER, Some(manager), &database("Database::Inventory"), None)
        .await
        .unwrap();
    fixture
        .relational
        .create_database(USER, None, &database("Database::Standalone"), None)
        .await
        .unwrap();

    let managed = fixture
        .relational
        .get_databases_for_database_manager(USER, manager, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(managed.len(), 1);
    assert_eq!(managed[0].header.guid, inventory);

    let all = fixture.relational.get_databases(USER, SearchOptions::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let found = fixture
        .relational
        .find_databases(USER, "Inventory", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_vendor_properties_round_trip() {
    let fixture = Fixture::new();
    let vendor: BTreeMap<String, String> = [("tablespace", "pg_default"), ("collation", "en_US")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let properties = DatabaseProperties {
        vendor_properties: vendor.clone(),
        ..database("Database::Vendor")
    };
    let guid = fixture.relational.create_database(USER, None, &properties, None).await.unwrap();

    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.vendor_properties, vendor);

    let change = DatabaseProperties {
        description: Some("now described".to_string()),
        ..Default::default()
    };
    fixture.relational.update_database(USER, guid, &change, true).await.unwrap();
    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.vendor_properties, vendor);
    assert_eq!(element.properties.description.as_deref(), Some("now described"));

    fixture
        .relational
        .update_database(USER, guid, &database("Database::Vendor"), false)
        .await
        .unwrap();
    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert!(element.properties.vendor_properties.is_empty());
    assert_eq!(element.properties.description, None);
}

#[tokio::test]
async fn test_database_from_template_copies_vendor_properties() {
    let fixture = Fixture::new();
    let properties = DatabaseProperties {
        vendor_properties: BTreeMap::from([("engine".to_string(), "innodb".to_string())]),
        ..database("Database::Template")
    };
    let template = fixture.relational.create_database(USER, None, &properties, None).await.unwrap();

    let overlay = TemplateProperties {
        qualified_name: Some("Database::Copy".to_string()),
        ..Default::default()
    };
    let copy = fixture
        .relational
        .create_database_from_template(USER, None, template, &overlay)
        .await
        .unwrap();

    let element = fixture.relational.get_database_by_guid(USER, copy, None).await.unwrap();
    assert_eq!(element.properties.qualified_name.as_deref(), Some("Database::Copy"));
    assert_eq!(element.properties.database_type.as_deref(), Some("PostgreSQL"));
    assert_eq!(element.properties.vendor_properties.get("engine").map(String::as_str), Some("innodb"));
}

#[tokio::test]
async fn test_publish_and_withdraw_move_zones() {
    let fixture = Fixture::with_env(&[("DEFAULT_ZONES", "draft"), ("PUBLISH_ZONES", "published")]);
    let guid = fixture
        .relational
        .create_database(USER, None, &database("Database::Zoned"), None)
        .await
        .unwrap();

    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.zone_membership, vec!["draft"]);

    fixture.relational.publish_database(USER, guid).await.unwrap();
    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.zone_membership, vec!["published"]);

    fixture.relational.withdraw_database(USER, guid).await.unwrap();
    let element = fixture.relational.get_database_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.zone_membership, vec!["draft"]);
}

#[tokio::test]
async fn test_unsupported_zones_are_hidden() {
    let fixture = Fixture::with_env(&[("SUPPORTED_ZONES", "data-lake"), ("DEFAULT_ZONES", "quarantine")]);
    let visible = fixture
        .relational
        .create_database(
            USER,
            None,
            &DatabaseProperties {
                zone_membership: vec!["data-lake".to_string()],
                ..database("Database::Lake")
            },
            None,
        )
        .await
        .unwrap();
    let hidden = fixture
        .relational
        .create_database(
            USER,
            None,
            &DatabaseProperties {
                zone_membership: vec!["quarantine".to_string()],
                ..database("Database::Quarantined")
            },
            None,
        )
        .await
        .unwrap();

    let found = fixture
        .relational
        .find_databases(USER, "Database::", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].header.guid, visible);

    let error = fixture.relational.get_database_by_guid(USER, hidden, None).await.unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_formula_makes_column_derived() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let properties = DatabaseColumnProperties {
        formula: Some("price * quantity".to_string()),
        data_type: Some("NUMERIC".to_string()),
        ..column("Column::orders.total")
    };
    let guid = fixture
        .relational
        .create_database_column(USER, catalog.table, &properties)
        .await
        .unwrap();

    let entity = fixture.generic.repository().get_entity(guid).await.unwrap().unwrap();
    let embedded = entity
        .classification(ClassificationTypeName::TypeEmbeddedAttribute.as_str())
        .expect("type is embedded");
    assert_eq!(embedded.properties.string(property_names::SCHEMA_TYPE_NAME), Some("DerivedSchemaType"));
    let calculated = entity
        .classification(ClassificationTypeName::CalculatedValue.as_str())
        .expect("column is calculated");
    assert_eq!(calculated.properties.string(property_names::FORMULA), Some("price * quantity"));

    let element = fixture.relational.get_database_column_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.formula.as_deref(), Some("price * quantity"));
    assert_eq!(element.properties.data_type.as_deref(), Some("NUMERIC"));

    // Replacing without a formula turns the column back into a primitive one
    fixture
        .relational
        .update_database_column(USER, guid, &column("Column::orders.total"), false)
        .await
        .unwrap();
    let entity = fixture.generic.repository().get_entity(guid).await.unwrap().unwrap();
    assert!(!entity.is_classified(ClassificationTypeName::CalculatedValue.as_str()));
    let embedded = entity
        .classification(ClassificationTypeName::TypeEmbeddedAttribute.as_str())
        .expect("type is embedded");
    assert_eq!(embedded.properties.string(property_names::SCHEMA_TYPE_NAME), Some("PrimitiveSchemaType"));
}

#[tokio::test]
async fn test_merge_update_keeps_embedded_type() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let guid = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.status"))
        .await
        .unwrap();

    let change = DatabaseColumnProperties {
        description: Some("Order status".to_string()),
        ..Default::default()
    };
    fixture.relational.update_database_column(USER, guid, &change, true).await.unwrap();

    let element = fixture.relational.get_database_column_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.description.as_deref(), Some("Order status"));
    assert_eq!(element.properties.data_type.as_deref(), Some("VARCHAR"));
}

#[tokio::test]
async fn test_primary_key_defaults_to_local_key() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let guid = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.id"))
        .await
        .unwrap();

    fixture.relational.set_primary_key_on_column(USER, guid, Some("orders_pk"), None).await.unwrap();
    let element = fixture.relational.get_database_column_by_guid(USER, guid, None).await.unwrap();
    let key = element.primary_key.expect("primary key is set");
    assert_eq!(key.key_pattern, KeyPattern::LocalKey);
    assert_eq!(key.name.as_deref(), Some("orders_pk"));

    fixture
        .relational
        .set_primary_key_on_column(USER, guid, None, Some(KeyPattern::NaturalKey))
        .await
        .unwrap();
    let element = fixture.relational.get_database_column_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.primary_key.map(|k| k.key_pattern), Some(KeyPattern::NaturalKey));

    fixture.relational.remove_primary_key_from_column(USER, guid).await.unwrap();
    let element = fixture.relational.get_database_column_by_guid(USER, guid, None).await.unwrap();
    assert!(element.primary_key.is_none());
}

#[tokio::test]
async fn test_foreign_key_lifecycle() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let primary = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.id"))
        .await
        .unwrap();
    let foreign = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.parent_id"))
        .await
        .unwrap();

    let properties = ForeignKeyProperties {
        name: Some("orders_parent_fk".to_string()),
        confidence: Some(100),
        ..Default::default()
    };
    let relationship = fixture
        .relational
        .add_foreign_key_relationship(USER, primary, foreign, &properties)
        .await
        .unwrap();

    let change = ForeignKeyProperties {
        description: Some("Self reference".to_string()),
        ..Default::default()
    };
    fixture
        .relational
        .update_foreign_key_relationship(USER, primary, foreign, &change, true)
        .await
        .unwrap();

    let keys = fixture
        .relational
        .get_foreign_keys_for_column(USER, foreign, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].relationship_guid, relationship);
    assert_eq!(keys[0].primary_key_column_guid, primary);
    assert_eq!(keys[0].foreign_key_column_guid, foreign);
    assert_eq!(keys[0].properties.name.as_deref(), Some("orders_parent_fk"));
    assert_eq!(keys[0].properties.description.as_deref(), Some("Self reference"));

    fixture
        .relational
        .remove_foreign_key_relationship(USER, primary, foreign)
        .await
        .unwrap();
    let keys = fixture
        .relational
        .get_foreign_keys_for_column(USER, primary, SearchOptions::default())
        .await
        .unwrap();
    assert!(keys.is_empty());

    let error = fixture
        .relational
        .update_foreign_key_relationship(USER, primary, foreign, &change, true)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_remove_database_cascades() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let column_guid = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::orders.id"))
        .await
        .unwrap();

    fixture.relational.remove_database(USER, catalog.database).await.unwrap();

    let error = fixture
        .relational
        .get_database_table_by_guid(USER, catalog.table, None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let error = fixture
        .relational
        .get_database_column_by_guid(USER, column_guid, None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let error = fixture
        .relational
        .get_database_schema_by_guid(USER, catalog.schema, None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_remove_table_keeps_schema() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;

    fixture.relational.remove_database_table(USER, catalog.table).await.unwrap();

    let tables = fixture
        .relational
        .get_tables_for_database_schema(USER, catalog.schema, SearchOptions::default())
        .await
        .unwrap();
    assert!(tables.is_empty());
    fixture
        .relational
        .get_database_schema_by_guid(USER, catalog.schema, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_column_template_with_unknown_type_is_rejected() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let template = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::template"))
        .await
        .unwrap();
    fixture
        .generic
        .set_classification(
            USER,
            template,
            "databaseColumnGUID",
            EntityTypeName::RelationalColumn,
            ClassificationTypeName::TypeEmbeddedAttribute,
            InstanceProperties::new().with_string(property_names::SCHEMA_TYPE_NAME, Some("NoSuchSchemaType")),
            false,
            "test",
        )
        .await
        .unwrap();

    let overlay = TemplateProperties {
        qualified_name: Some("Column::copy".to_string()),
        ..Default::default()
    };
    let error = fixture
        .relational
        .create_database_column_from_template(USER, catalog.table, template, &overlay)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_column_from_template() {
    let fixture = Fixture::new();
    let catalog = catalog(&fixture).await;
    let template = fixture
        .relational
        .create_database_column(USER, catalog.table, &column("Column::template"))
        .await
        .unwrap();

    let overlay = TemplateProperties {
        qualified_name: Some("Column::copy".to_string()),
        ..Default::default()
    };
    let copy = fixture
        .relational
        .create_database_column_from_template(USER, catalog.table, template, &overlay)
        .await
        .unwrap();

    let element = fixture.relational.get_database_column_by_guid(USER, copy, None).await.unwrap();
    assert_eq!(element.properties.qualified_name.as_deref(), Some("Column::copy"));
    assert_eq!(element.properties.data_type.as_deref(), Some("VARCHAR"));

    let columns = fixture
        .relational
        .get_columns_for_database_table(USER, catalog.table, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(columns.len(), 2);
}

#[tokio::test]
async fn test_schema_type_name_must_be_known() {
    let fixture = Fixture::new();
    let error = fixture
        .relational
        .create_database_schema(
            USER,
            None,
            &DatabaseSchemaProperties {
                qualified_name: Some("Schema::Bad".to_string()),
                ..Default::default()
            },
            Some("NoSuchType"),
        )
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}
