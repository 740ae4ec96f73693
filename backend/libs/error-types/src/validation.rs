//! Validation error types
//!
//! Field-level validation errors raised while checking handler parameters.
//! They convert into `MetadataError::InvalidParameter` at the handler
//! boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Validation error with field-level details
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[error("Validation failed: {message}")]
pub struct ValidationError {
    /// High-level validation message
    pub message: String,

    /// Operation that rejected the input
    pub method: Option<String>,

    /// Field-specific errors
    pub field_errors: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            method: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn for_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn add_field_error(
        mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let error = FieldError {
            code: code.into(),
            message: message.into(),
        };

        self.field_errors.entry(field.into()).or_default().push(error);

        self
    }

    pub fn error_count(&self) -> usize {
        self.field_errors.values().map(|v| v.len()).sum()
    }
}

/// Individual field validation error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    /// Error code (e.g., "required", "invalid_format", "too_large")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

/// Common validation rules
pub mod rules {
    use super::ValidationError;

    /// Validate required field
    pub fn validate_required(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::new(format!("{field} is required"))
                .add_field_error(field, "required", "This field is required")),
        }
    }

    /// Validate numeric range
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValidationError> {
        if let Some(min) = min {
            if value < min {
                return Err(ValidationError::new(format!("{field} must be at least {min}"))
                    .add_field_error(field, "too_small", format!("Must be at least {}", min)));
            }
        }

        if let Some(max) = max {
            if value > max {
                return Err(ValidationError::new(format!("{field} must be at most {max}"))
                    .add_field_error(field, "too_large", format!("Must be at most {}", max)));
            }
        }

        Ok(())
    }
}
