//! Structured API error responses with error codes
//!
//! Every error body carries a human-readable `detail`, a stable machine code,
//! and, for row validation failures, the offending rows and fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::FieldError;
use crate::infra::{AuditError, PipelineError};
use crate::report::ReportError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Tenant errors (1xxx)
    /// No tenant identifier on a protected route
    MissingTenant,

    // Plan errors (2xxx)
    /// Unknown subscription plan
    InvalidPlan,
    /// Batch exceeds the plan's row cap
    PlanLimitExceeded,

    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// One or more invoice rows failed validation
    ValidationFailed,
    /// Upload is not UTF-8
    InvalidEncoding,
    /// CSV header lacks required columns
    MissingColumns,
    /// CSV structure could not be parsed
    MalformedCsv,

    // Resource errors (4xxx)
    /// Requested resource not found
    ResourceNotFound,
    /// No reconciled batch for the tenant
    ReportNotFound,

    // Rendering errors (6xxx)
    /// Document rendering failed
    RenderFailed,

    // State errors (7xxx)
    /// Invariant violation
    InvariantViolation,

    // Infrastructure errors (8xxx)
    /// Shared state unavailable
    StorageError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::MissingTenant => 1001,

            ErrorCode::InvalidPlan => 2001,
            ErrorCode::PlanLimitExceeded => 2002,

            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::ValidationFailed => 3002,
            ErrorCode::InvalidEncoding => 3003,
            ErrorCode::MissingColumns => 3004,
            ErrorCode::MalformedCsv => 3005,

            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::ReportNotFound => 4002,

            ErrorCode::RenderFailed => 6001,

            ErrorCode::InvariantViolation => 7001,

            ErrorCode::StorageError => 8001,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingTenant => StatusCode::BAD_REQUEST,

            ErrorCode::InvalidPlan => StatusCode::BAD_REQUEST,
            ErrorCode::PlanLimitExceeded => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::InvalidRequestBody
            | ErrorCode::ValidationFailed
            | ErrorCode::InvalidEncoding
            | ErrorCode::MissingColumns
            | ErrorCode::MalformedCsv => StatusCode::BAD_REQUEST,

            ErrorCode::ResourceNotFound | ErrorCode::ReportNotFound => StatusCode::NOT_FOUND,

            ErrorCode::RenderFailed
            | ErrorCode::InvariantViolation
            | ErrorCode::StorageError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::MissingTenant => "MISSING_TENANT",
            ErrorCode::InvalidPlan => "INVALID_PLAN",
            ErrorCode::PlanLimitExceeded => "PLAN_LIMIT_EXCEEDED",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidEncoding => "INVALID_ENCODING",
            ErrorCode::MissingColumns => "MISSING_COLUMNS",
            ErrorCode::MalformedCsv => "MALFORMED_CSV",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ReportNotFound => "REPORT_NOT_FOUND",
            ErrorCode::RenderFailed => "RENDER_FAILED",
            ErrorCode::InvariantViolation => "INVARIANT_VIOLATION",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub detail: String,

    /// Machine-readable error code
    pub code: ErrorCode,

    /// Offending rows and fields for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code,
            errors: None,
        }
    }

    /// Attach per-field validation errors
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.code.to_string();

        if status.is_server_error() {
            tracing::error!(
                code = %code_str,
                numeric_code = self.code.numeric_code(),
                detail = %self.detail,
                "Request failed"
            );
        }

        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let detail = err.to_string();
        match err {
            PipelineError::Validation(errors) => {
                ApiError::new(ErrorCode::ValidationFailed, detail).with_errors(errors)
            }
            PipelineError::LimitExceeded { .. } => ApiError::new(ErrorCode::PlanLimitExceeded, detail),
            PipelineError::InvalidPlan(_) => ApiError::new(ErrorCode::InvalidPlan, detail),
            PipelineError::InvalidEncoding => ApiError::new(ErrorCode::InvalidEncoding, detail),
            PipelineError::MissingColumns(_) => ApiError::new(ErrorCode::MissingColumns, detail),
            PipelineError::MalformedCsv(_) => ApiError::new(ErrorCode::MalformedCsv, detail),
            PipelineError::InvariantViolation { .. } => {
                ApiError::new(ErrorCode::InvariantViolation, detail)
            }
            PipelineError::Storage(_) => ApiError::new(ErrorCode::StorageError, detail),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(_) => ApiError::new(
                ErrorCode::ReportNotFound,
                "No reconciliation results found for this session.",
            ),
            ReportError::Render(msg) => {
                ApiError::new(ErrorCode::RenderFailed, format!("Report rendering failed: {msg}"))
            }
            ReportError::Store(e) => e.into(),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::new(ErrorCode::InternalError, err.to_string())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a not found error for a path
pub fn not_found(path: impl std::fmt::Display) -> ApiError {
    ApiError::new(ErrorCode::ResourceNotFound, format!("Not Found: {}", path))
}

/// Create an invalid request body error
pub fn invalid_body(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidRequestBody, message.into())
}

// ============================================================================
// Tests
// ============================================================================
