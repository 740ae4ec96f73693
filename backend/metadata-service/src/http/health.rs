use super::AppState;
use crate::metrics;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Ready once the repository answers
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    match state.repository().health_check().await {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ready"})),
        Err(error) => {
            warn!(error = %error, "Repository health check failed");
            HttpResponse::ServiceUnavailable().json(json!({"status": "unavailable"}))
        }
    }
}

pub async fn metrics() -> HttpResponse {
    match metrics::render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(error) => {
            warn!(error = %error, "Failed to render metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
