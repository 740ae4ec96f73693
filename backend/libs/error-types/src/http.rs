//! HTTP error response handling
//!
//! Consistent JSON bodies for REST callers of the metadata service.

use crate::MetadataError;
use serde::{Deserialize, Serialize};

/// Standard HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for client handling
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Parameter that was rejected, for invalid-parameter errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HttpErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            parameter: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }
}

impl From<&MetadataError> for HttpErrorResponse {
    fn from(error: &MetadataError) -> Self {
        match error {
            MetadataError::InvalidParameter { parameter, .. } => {
                HttpErrorResponse::new(status::BAD_REQUEST, error.code(), error.to_string())
                    .with_parameter(parameter.clone())
            }
            MetadataError::UserNotAuthorized { .. } => {
                HttpErrorResponse::new(status::FORBIDDEN, error.code(), error.to_string())
            }
            // Don't expose repository details to clients
            MetadataError::PropertyServer { method, .. } => HttpErrorResponse::new(
                status::INTERNAL_SERVER_ERROR,
                error.code(),
                format!("Metadata repository failure in {}", method),
            ),
        }
    }
}

/// HTTP status code helpers
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}
