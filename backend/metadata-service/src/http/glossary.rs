use super::{ApiResult, AppState, GuidResponse, NameQuery, PagingQuery, SearchQuery};
use crate::domain::{ArchiveProperties, GlossaryTermProperties, Guid, InstanceStatus, TemplateProperties};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermRequest {
    pub properties: GlossaryTermProperties,
    pub type_name: Option<String>,
    pub initial_status: Option<InstanceStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermFromTemplateRequest {
    pub template_guid: Guid,
    pub properties: TemplateProperties,
    #[serde(default)]
    pub deep_copy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTermRequest {
    pub glossary_guid: Guid,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: InstanceStatus,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/glossaries/{glossary_guid}/terms")
            .route("", web::post().to(create_term))
            .route("", web::get().to(get_terms_for_glossary))
            .route("/from-template", web::post().to(create_term_from_template)),
    )
    .service(
        web::scope("/glossary-terms")
            .route("/by-search-string", web::get().to(find_terms))
            .route("/by-name", web::get().to(get_terms_by_name))
            .route("/{term_guid}", web::get().to(get_term))
            .route("/{term_guid}", web::patch().to(merge_term))
            .route("/{term_guid}", web::put().to(replace_term))
            .route("/{term_guid}", web::delete().to(remove_term))
            .route("/{term_guid}/status", web::post().to(update_term_status))
            .route("/{term_guid}/move", web::post().to(move_term))
            .route("/{term_guid}/archive", web::post().to(archive_term)),
    );
}

async fn create_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CreateTermRequest>,
) -> ApiResult {
    let (user_id, glossary_guid) = path.into_inner();
    let glossary_guid = state.guid(&glossary_guid, "glossaryGUID", "create_glossary_term")?;
    let body = body.into_inner();

    let guid = state
        .glossary_terms
        .create_glossary_term(
            &user_id,
            glossary_guid,
            &body.properties,
            body.type_name.as_deref(),
            body.initial_status,
        )
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn create_term_from_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CreateTermFromTemplateRequest>,
) -> ApiResult {
    let (user_id, glossary_guid) = path.into_inner();
    let glossary_guid = state.guid(&glossary_guid, "glossaryGUID", "create_glossary_term_from_template")?;

    let guid = state
        .glossary_terms
        .create_glossary_term_from_template(
            &user_id,
            glossary_guid,
            body.template_guid,
            &body.properties,
            body.deep_copy,
        )
        .await?;
    Ok(HttpResponse::Created().json(GuidResponse { guid }))
}

async fn get_terms_for_glossary(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, glossary_guid) = path.into_inner();
    let glossary_guid = state.guid(&glossary_guid, "glossaryGUID", "get_terms_for_glossary")?;
    let statuses = paging.statuses();

    let terms = state
        .glossary_terms
        .get_terms_for_glossary(&user_id, glossary_guid, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(terms))
}

async fn get_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "get_term_by_guid")?;

    let term = state
        .glossary_terms
        .get_term_by_guid(&user_id, term_guid, paging.effective_time)
        .await?;
    Ok(HttpResponse::Ok().json(term))
}

async fn update_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<GlossaryTermProperties>,
    is_merge_update: bool,
) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "update_glossary_term")?;

    state
        .glossary_terms
        .update_glossary_term(&user_id, term_guid, &body, is_merge_update)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn merge_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<GlossaryTermProperties>,
) -> ApiResult {
    update_term(state, path, body, true).await
}

async fn replace_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<GlossaryTermProperties>,
) -> ApiResult {
    update_term(state, path, body, false).await
}

async fn update_term_status(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<StatusRequest>,
) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "update_glossary_term_status")?;

    state
        .glossary_terms
        .update_glossary_term_status(&user_id, term_guid, body.status)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn move_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<MoveTermRequest>,
) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "move_glossary_term")?;

    state
        .glossary_terms
        .move_glossary_term(&user_id, term_guid, body.glossary_guid)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn archive_term(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<ArchiveProperties>,
) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "archive_glossary_term")?;

    state
        .glossary_terms
        .archive_glossary_term(&user_id, term_guid, &body)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn remove_term(state: web::Data<AppState>, path: web::Path<(String, String)>) -> ApiResult {
    let (user_id, term_guid) = path.into_inner();
    let term_guid = state.guid(&term_guid, "glossaryTermGUID", "remove_glossary_term")?;

    state
        .glossary_terms
        .remove_glossary_term(&user_id, term_guid)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn find_terms(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    search: web::Query<SearchQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let terms = state
        .glossary_terms
        .find_terms(&user_id, &search.search_string, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(terms))
}

async fn get_terms_by_name(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    query: web::Query<NameQuery>,
    paging: web::Query<PagingQuery>,
) -> ApiResult {
    let statuses = paging.statuses();
    let terms = state
        .glossary_terms
        .get_terms_by_name(&user_id, &query.name, paging.options(&statuses))
        .await?;
    Ok(HttpResponse::Ok().json(terms))
}
