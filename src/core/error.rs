//! Typed error handling for the payroll service
//!
//! Every failure that reaches an HTTP handler is a [`PayrollError`]. Each
//! category knows its HTTP status and a stable error code, and the whole
//! error renders as a JSON body:
//!
//! ```json
//! { "message": "employee with id '...' not found", "error": "ENTITY_NOT_FOUND" }
//! ```
//!
//! # Error Categories
//!
//! - [`EntityError`]: record lookups, uniqueness and lifecycle conflicts
//! - [`ValidationError`]: malformed payloads and business-rule violations
//! - [`AuthError`]: missing identity, forbidden role, missing tenant
//! - [`ConfigError`]: configuration parsing
//! - [`StorageError`]: storage backend failures

use crate::finance::FinanceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Convenience alias used by handlers and services.
pub type PayrollResult<T> = Result<T, PayrollError>;

/// The main error type for the payroll service
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Record-related errors (CRUD operations and lifecycle)
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Payload and business-rule validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Identity and authorization errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub error: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PayrollError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::Entity(e) => e.status_code(),
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::Auth(e) => e.status_code(),
            PayrollError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PayrollError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PayrollError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PayrollError::Entity(e) => e.error_code(),
            PayrollError::Validation(e) => e.error_code(),
            PayrollError::Auth(e) => e.error_code(),
            PayrollError::Config(_) => "CONFIG_ERROR",
            PayrollError::Storage(_) => "STORAGE_ERROR",
            PayrollError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
            error: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PayrollError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id.to_string()
                }))
            }
            PayrollError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }

    /// Shorthand for a not-found error
    pub fn not_found(entity_type: &str, id: Uuid) -> Self {
        PayrollError::Entity(EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id,
        })
    }

    /// Shorthand for a single business-rule violation
    pub fn rule(field: &str, message: impl Into<String>) -> Self {
        PayrollError::Validation(ValidationError::Rule {
            field: field.to_string(),
            message: message.into(),
        })
    }

    /// Wrap a storage backend failure
    pub fn storage(operation: &str, err: anyhow::Error) -> Self {
        PayrollError::Storage(StorageError::Operation {
            operation: operation.to_string(),
            message: err.to_string(),
        })
    }
}

impl IntoResponse for PayrollError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::warn!(error = %self, code = self.error_code(), "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for PayrollError {
    fn from(err: anyhow::Error) -> Self {
        PayrollError::storage("storage", err)
    }
}

impl From<serde_json::Error> for PayrollError {
    fn from(err: serde_json::Error) -> Self {
        PayrollError::Internal(format!("serialization failed: {}", err))
    }
}

impl From<FinanceError> for PayrollError {
    fn from(err: FinanceError) -> Self {
        PayrollError::Validation(ValidationError::Rule {
            field: err.field().to_string(),
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to record operations
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: Uuid },

    /// A uniqueness constraint was violated
    #[error("{entity_type} with {field} '{value}' already exists")]
    AlreadyExists {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A reference field points at a record that does not exist in the tenant
    #[error("{field} '{id}' does not reference an existing {entity_type}")]
    InvalidReference {
        entity_type: String,
        field: String,
        id: Uuid,
    },

    /// The record is still referenced or otherwise cannot change
    #[error("Cannot modify {entity_type}: {message}")]
    Conflict {
        entity_type: String,
        message: String,
    },

    #[error("{entity_type} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity_type: String,
        from: String,
        to: String,
    },
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
            EntityError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            EntityError::Conflict { .. } => StatusCode::CONFLICT,
            EntityError::InvalidTransition { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
            EntityError::InvalidReference { .. } => "INVALID_REFERENCE",
            EntityError::Conflict { .. } => "ENTITY_CONFLICT",
            EntityError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// Per-field messages produced by the payload validators
    #[error("Validation failed for {} field(s)", .0.len())]
    FieldErrors(BTreeMap<String, Vec<String>>),

    /// A single business rule on a field
    #[error("Invalid {field}: {message}")]
    Rule { field: String, message: String },

    #[error("Invalid UUID format: {value}")]
    InvalidUuid { value: String },

    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::Rule { .. } => "VALIDATION_ERROR",
            ValidationError::InvalidUuid { .. } => "INVALID_UUID",
            ValidationError::InvalidQuery { .. } => "INVALID_QUERY",
        }
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors related to identity and authorization
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Missing company scope: the x-company-id header is required")]
    MissingCompany,

    #[error("Invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::MissingCompany => StatusCode::BAD_REQUEST,
            AuthError::InvalidHeader { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::MissingCompany => "MISSING_COMPANY",
            AuthError::InvalidHeader { .. } => "INVALID_HEADER",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("IO error: {message}")]
    IoError { message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to connect to {backend}: {message}")]
    ConnectionError { backend: String, message: String },

    #[error("Storage {operation} failed: {message}")]
    Operation { operation: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = PayrollError::not_found("employee", Uuid::nil());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
        assert!(err.to_string().contains("employee"));
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let err = PayrollError::Auth(AuthError::Forbidden {
            message: "role 'employee' cannot create orders".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_rule_maps_to_400() {
        let err = PayrollError::rule("advance_paid", "exceeds order amount");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid advance_paid: exceeds order amount");
    }

    #[test]
    fn test_duplicate_maps_to_409() {
        let err = PayrollError::Entity(EntityError::AlreadyExists {
            entity_type: "employee".to_string(),
            field: "email".to_string(),
            value: "a@b.in".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let err: PayrollError = anyhow::anyhow!("lock poisoned").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_response_body_has_message_and_error() {
        let err = PayrollError::not_found("order", Uuid::nil());
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["error"], "ENTITY_NOT_FOUND");
        assert!(body["message"].as_str().unwrap().contains("order"));
        assert_eq!(body["details"]["entity_type"], "order");
    }

    #[test]
    fn test_field_errors_carry_details() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), vec!["invalid email".to_string()]);
        let err = PayrollError::Validation(ValidationError::FieldErrors(fields));
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["details"]["fields"]["email"][0], "invalid email");
    }

    #[test]
    fn test_config_parse_error_mentions_file() {
        let err = ConfigError::ParseError {
            file: Some("payroll.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse config file 'payroll.yaml': bad indent"
        );
    }
}
