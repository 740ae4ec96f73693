//! REST surface over the handlers
//!
//! Routes follow the open-metadata convention of carrying the calling user
//! in the path: `/api/v1/users/{user_id}/...`. Bodies are JSON and errors
//! are rendered as [`HttpErrorResponse`].

mod glossary;
mod health;
mod relational;

use crate::domain::{Guid, InstanceStatus};
use crate::handlers::{
    GenericHandler, GlossaryTermHandler, PropertyFacetHandler, ReferenceValueHandler,
    RelationalDataHandler, SearchOptions,
};
use crate::repository::MetadataRepository;
use crate::validation::InvalidParameterHandler;
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use error_types::{HttpErrorResponse, MetadataError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Handlers shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub glossary_terms: GlossaryTermHandler,
    pub relational_data: RelationalDataHandler,
    pub property_facets: PropertyFacetHandler,
    pub reference_values: ReferenceValueHandler,
    repository: Arc<dyn MetadataRepository>,
    invalid_parameter_handler: InvalidParameterHandler,
}

impl AppState {
    pub fn new(generic: &GenericHandler) -> Self {
        Self {
            glossary_terms: GlossaryTermHandler::new(generic),
            relational_data: RelationalDataHandler::new(generic),
            property_facets: PropertyFacetHandler::new(generic),
            reference_values: ReferenceValueHandler::new(generic),
            repository: Arc::clone(generic.repository()),
            invalid_parameter_handler: *generic.invalid_parameter_handler(),
        }
    }

    pub(crate) fn repository(&self) -> &Arc<dyn MetadataRepository> {
        &self.repository
    }

    /// Parse a guid taken from the path
    pub(crate) fn guid(&self, value: &str, parameter: &str, method: &str) -> Result<Guid, ApiError> {
        Ok(self.invalid_parameter_handler.parse_guid(value, parameter, method)?)
    }
}

/// `MetadataError` carried across the actix boundary
#[derive(Debug)]
pub struct ApiError(pub MetadataError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<MetadataError> for ApiError {
    fn from(error: MetadataError) -> Self {
        Self(error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        let body = HttpErrorResponse::from(&self.0);
        StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(HttpErrorResponse::from(&self.0))
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidResponse {
    pub guid: Guid,
}

/// Paging and effectivity query parameters shared by list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagingQuery {
    pub start_from: i32,
    pub page_size: i32,
    pub effective_time: Option<DateTime<Utc>>,
    pub status: Option<InstanceStatus>,
}

impl PagingQuery {
    pub fn options<'a>(&self, statuses: &'a [InstanceStatus]) -> SearchOptions<'a> {
        SearchOptions {
            statuses,
            effective_time: self.effective_time,
            start_from: self.start_from,
            page_size: self.page_size,
        }
    }

    /// Status filter; empty when the query names none
    pub fn statuses(&self) -> Vec<InstanceStatus> {
        self.status.into_iter().collect()
    }
}

/// Read alongside [`PagingQuery`] from the same query string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search_string: String,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// Register every route under `/api/v1` plus `/metrics`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(health::metrics)).service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health))
            .route("/health/ready", web::get().to(health::readiness))
            .service(
                web::scope("/users/{user_id}")
                    .configure(glossary::configure)
                    .configure(relational::configure),
            ),
    );
}
