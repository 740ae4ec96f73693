use super::{ApiResult, AppState, GuidResponse, PagingQuery, SearchQuery};
use crate::domain::{
    DatabaseColumnProperties, DatabaseProperties, DatabaseSchemaProperties, DatabaseTableProperties,
    ForeignKeyProperties, Guid, KeyPattern,
};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseRequest {
    pub database_manager_guid: Option<Guid>,
    pub type_name: Option<String>,
    pub properties: DatabaseProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchemaRequest {
    pub type_name: Option<String>,
    pub properties: DatabaseSchemaProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyRequest {
    pub name: Option<String>,
    pub key_pattern: Option<KeyPattern>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/databases")
            .route("", web::post().to(create_database))
            .route("/by-search-string", web::get().to(find_databases))
            .route("/{database_guid}", web::get().to(get_database))
            .route("/{database_guid}", web::delete().to(remove_database))
            .route("/{database_guid}/schemas", web::post().to(create_schema))
            .route("/{database_guid}/schemas", web::get().to(get_schemas_for_database)),
    )
    .service(
        web::scope("/database-schemas")
            .route("/by-search-string", web::get().to(find_schemas))
            .route("/{schema_guid}", web::get().to(get_schema))
            .route("/{schema_guid}/tables", web::post().to(create_table))
            .route("/{schema_guid}/tables", web::get().to(get_tables_for_schema)),
    )
    .service(
        web::scope("/database-tables")
            .route("/by-search-string", web::get().to(find_tables))
            .route("/{table_guid}", web::get().to(get_table))
            .route("/{table_guid}/columns", web::post().to(create_column))
            .route("/{table_guid}/columns", web::get().to(get_columns_for_table)),
    )
    .service(
        web::scope("/database-columns")
            .route("/by-search-string", web::get().to(find_columns))
            .route("/{column_guid}", web::get().to(get_column))
            .route("/{column_guid}/primary-key", web::post().to(set_primary_key))
            .route("/{column_guid}/primary-key", web::delete().to(remove_primary_key))
            .route(
                "/{primary_key_column_guid}/foreign-keys/{foreign_key_column_guid}",
                web::post().to(add_foreign_key),
            )
            .route(
                "/{primary_key_column_guid}/foreign-keys/{foreign_key_column_guid}",
                web::delete().to(remove_foreign_key),
            ),
    );
}

// ----------------------------------------------------------------------
// Databases
// ----------------------------------------------------------------------

async fn create_database(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    body: web::Json<CreateDatabaseRequest>,
) -> ApiResult {
    let guid = state
        .relational_data
        .create_database(
            &user_id,
            body.database_manager_guid,
            &body.properties,
            body.type_name.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn get_database(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, database_guid) = path.into_inner();
    let database_guid = state.guid(&database_guid, "databaseGUID", "get_database_by_guid")?;

    let database = state
        .relational_data
        .get_database_by_guid(&user_id, database_guid, paging.effective_time)
        .await?;
    Ok(HttpResponse::Ok().json(database))
}

async fn remove_database(state: web::Data<AppState>, path: web::Path<(String, String)>) -> ApiResult {
    let (user_id, database_guid) = path.into_inner();
    let database_guid = state.guid(&database_guid, "databaseGUID", "remove_database")?;

    state
        .relational_data
        .remove_database(&user_id, database_guid)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn find_databases(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    search: web::Query<SearchQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let databases = state
        .relational_data
        .find_databases(&user_id, &search.search_string, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(databases))
}

// ----------------------------------------------------------------------
// Schemas
// ----------------------------------------------------------------------

async fn create_schema(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CreateSchemaRequest>,
) -> ApiResult {
    let (user_id, database_guid) = path.into_inner();
    let database_guid = state.guid(&database_guid, "databaseGUID", "create_database_schema")?;

    let guid = state
        .relational_data
        .create_database_schema(
            &user_id,
            Some(database_guid),
            &body.properties,
            body.type_name.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn get_schemas_for_database(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, database_guid) = path.into_inner();
    let database_guid = state.guid(&database_guid, "databaseGUID", "get_schemas_for_database")?;
    let statuses = paging.statuses();

    let schemas = state
        .relational_data
        .get_schemas_for_database(&user_id, database_guid, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(schemas))
}

async fn get_schema(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, schema_guid) = path.into_inner();
    let schema_guid = state.guid(&schema_guid, "databaseSchemaGUID", "get_database_schema_by_guid")?;

    let schema = state
        .relational_data
        .get_database_schema_by_guid(&user_id, schema_guid, paging.effective_time)
        .await?;
    Ok(HttpResponse::Ok().json(schema))
}

async fn find_schemas(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    search: web::Query<SearchQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let schemas = state
        .relational_data
        .find_database_schemas(&user_id, &search.search_string, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(schemas))
}

// ----------------------------------------------------------------------
// Tables
// ----------------------------------------------------------------------

async fn create_table(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<DatabaseTableProperties>,
) -> ApiResult {
    let (user_id, schema_guid) = path.into_inner();
    let schema_guid = state.guid(&schema_guid, "databaseSchemaGUID", "create_database_table")?;

    let guid = state
        .relational_data
        .create_database_table(&user_id, schema_guid, &body)
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn get_tables_for_schema(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, schema_guid) = path.into_inner();
    let schema_guid = state.guid(&schema_guid, "databaseSchemaGUID", "get_tables_for_database_schema")?;
    let statuses = paging.statuses();

    let tables = state
        .relational_data
        .get_tables_for_database_schema(&user_id, schema_guid, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(tables))
}

async fn get_table(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, table_guid) = path.into_inner();
    let table_guid = state.guid(&table_guid, "databaseTableGUID", "get_database_table_by_guid")?;

    let table = state
        .relational_data
        .get_database_table_by_guid(&user_id, table_guid, paging.effective_time)
        .await?;
    Ok(HttpResponse::Ok().json(table))
}

async fn find_tables(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    search: web::Query<SearchQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let tables = state
        .relational_data
        .find_database_tables(&user_id, &search.search_string, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(tables))
}

// ----------------------------------------------------------------------
// Columns and keys
// ----------------------------------------------------------------------

async fn create_column(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<DatabaseColumnProperties>,
) -> ApiResult {
    let (user_id, table_guid) = path.into_inner();
    let table_guid = state.guid(&table_guid, "databaseTableGUID", "create_database_column")?;

    let guid = state
        .relational_data
        .create_database_column(&user_id, table_guid, &body)
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn get_columns_for_table(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, table_guid) = path.into_inner();
    let table_guid = state.guid(&table_guid, "databaseTableGUID", "get_columns_for_database_table")?;
    let statuses = paging.statuses();

    let columns = state
        .relational_data
        .get_columns_for_database_table(&user_id, table_guid, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(columns))
}

async fn get_column(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, column_guid) = path.into_inner();
    let column_guid = state.guid(&column_guid, "databaseColumnGUID", "get_database_column_by_guid")?;

    let column = state
        .relational_data
        .get_database_column_by_guid(&user_id, column_guid, paging.effective_time)
        .await?;
    Ok(HttpResponse::Ok().json(column))
}

async fn find_columns(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    search: web::Query<SearchQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let columns = state
        .relational_data
        .find_database_columns(&user_id, &search.search_string, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(columns))
}

async fn set_primary_key(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<PrimaryKeyRequest>,
) -> ApiResult {
    let (user_id, column_guid) = path.into_inner();
    let column_guid = state.guid(&column_guid, "databaseColumnGUID", "set_primary_key_on_column")?;

    state
        .relational_data
        .set_primary_key_on_column(&user_id, column_guid, body.name.as_deref(), body.key_pattern)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn remove_primary_key(state: web::Data<AppState>, path: web::Path<(String, String)>) -> ApiResult {
    let (user_id, column_guid) = path.into_inner();
    let column_guid = state.guid(&column_guid, "databaseColumnGUID", "remove_primary_key_from_column")?;

    state
        .relational_data
        .remove_primary_key_from_column(&user_id, column_guid)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_foreign_key(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    body: web::Json<ForeignKeyProperties>,
) -> ApiResult {
    const METHOD: &str = "add_foreign_key_relationship";
    let (user_id, primary, foreign) = path.into_inner();
    let primary = state.guid(&primary, "primaryKeyColumnGUID", METHOD)?;
    let foreign = state.guid(&foreign, "foreignKeyColumnGUID", METHOD)?;

    let guid = state
        .relational_data
        .add_foreign_key_relationship(&user_id, primary, foreign, &body)
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn remove_foreign_key(state: web::Data<AppState>, path: web::Path<(String, String, String)>) -> ApiResult {
    const METHOD: &str = "remove_foreign_key_relationship";
    let (user_id, primary, foreign) = path.into_inner();
    let primary = state.guid(&primary, "primaryKeyColumnGUID", METHOD)?;
    let foreign = state.guid(&foreign, "foreignKeyColumnGUID", METHOD)?;

    state
        .relational_data
        .remove_foreign_key_relationship(&user_id, primary, foreign)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
