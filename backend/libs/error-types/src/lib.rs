//! Error types shared by the metadata handlers
//!
//! Every handler operation surfaces exactly one of three checked error
//! kinds:
//!
//! 1. **InvalidParameter**: bad input, unknown type, missing required field
//! 2. **UserNotAuthorized**: the security verifier rejected the caller
//! 3. **PropertyServer**: the repository (or another backend) failed
//!
//! Errors are propagated verbatim; handlers never retry and never roll back
//! partially applied sequences.

use std::fmt;
use thiserror::Error;

pub mod http;
pub mod validation;

pub use http::HttpErrorResponse;
pub use validation::{FieldError, ValidationError};

/// Core error type returned by every metadata handler operation
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Caller supplied a malformed or unknown value
    #[error("Invalid parameter {parameter} passed to {method}: {message}")]
    InvalidParameter {
        message: String,
        parameter: String,
        method: String,
    },

    /// Security verifier rejected the request
    #[error("User {user_id} is not authorized to {action} {guid}")]
    UserNotAuthorized {
        user_id: String,
        action: String,
        guid: String,
    },

    /// Repository or other backend fault
    #[error("Property server error in {method}: {message}")]
    PropertyServer {
        message: String,
        method: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl MetadataError {
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            parameter: parameter.into(),
            method: method.into(),
        }
    }

    pub fn not_authorized(
        user_id: impl Into<String>,
        action: impl Into<String>,
        guid: impl Into<String>,
    ) -> Self {
        Self::UserNotAuthorized {
            user_id: user_id.into(),
            action: action.into(),
            guid: guid.into(),
        }
    }

    pub fn property_server(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PropertyServer {
            message: message.into(),
            method: method.into(),
            source: None,
        }
    }

    /// Wrap a lower-level backend failure
    pub fn backend<E: Into<anyhow::Error>>(method: impl Into<String>, error: E) -> Self {
        let source = error.into();
        Self::PropertyServer {
            message: source.to_string(),
            method: method.into(),
            source: Some(source),
        }
    }

    /// Stable code used in HTTP bodies and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::UserNotAuthorized { .. } => "USER_NOT_AUTHORIZED",
            Self::PropertyServer { .. } => "PROPERTY_SERVER_ERROR",
        }
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::UserNotAuthorized { .. })
    }

    pub fn is_property_server(&self) -> bool {
        matches!(self, Self::PropertyServer { .. })
    }

    /// Log error with appropriate level and context
    pub fn log(&self) {
        match self {
            Self::InvalidParameter { .. } => {
                tracing::debug!(error = %self, "Client error");
            }
            Self::UserNotAuthorized { .. } => {
                tracing::warn!(error = %self, "Authorization failure");
            }
            Self::PropertyServer { .. } => {
                tracing::error!(error = ?self, "Server error");
            }
        }
    }
}

impl From<ValidationError> for MetadataError {
    fn from(error: ValidationError) -> Self {
        let parameter = error
            .field_errors
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| "request".to_string());
        Self::InvalidParameter {
            message: error.message.clone(),
            parameter,
            method: error.method.clone().unwrap_or_default(),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for MetadataError {
    fn from(error: sqlx::Error) -> Self {
        Self::backend("repository", error)
    }
}

/// Result type alias for handler operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Error context extension trait for turning backend failures into
/// property-server errors
pub trait ErrorContext<T> {
    fn context<C>(self, context: C) -> MetadataResult<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> MetadataResult<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| MetadataError::backend(context.to_string(), e))
    }
}
