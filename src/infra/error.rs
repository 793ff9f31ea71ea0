//! Error types for the ingestion pipeline and state store

use thiserror::Error;

use crate::domain::{FieldError, PlanTier};

/// Errors that can occur while ingesting, reconciling or storing a batch
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more rows failed field validation
    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Batch exceeds the plan's row cap
    #[error("Invoice limit exceeded for your current plan ({plan}). Limit: {limit}, Uploaded: {actual}")]
    LimitExceeded {
        plan: PlanTier,
        limit: usize,
        actual: usize,
    },

    /// Unknown plan tier
    #[error("{0}")]
    InvalidPlan(String),

    /// Upload is not valid UTF-8
    #[error("Invalid file encoding. Please upload a valid UTF-8 CSV.")]
    InvalidEncoding,

    /// Header row lacks required columns
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// CSV could not be parsed
    #[error("Invalid CSV format: {0}")]
    MalformedCsv(#[from] csv::Error),

    /// Internal invariant broken
    #[error("invariant violation: {invariant} - {message}")]
    InvariantViolation { invariant: String, message: String },

    /// Shared state unavailable
    #[error("storage error: {0}")]
    Storage(String),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_rows() {
        let err = PipelineError::Validation(vec![
            FieldError {
                row: 1,
                field: "gstin".into(),
                message: "Invalid GSTIN format".into(),
            },
            FieldError {
                row: 4,
                field: "cgst".into(),
                message: "cgst must be strictly numeric".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Row 1: gstin: Invalid GSTIN format; Row 4: cgst: cgst must be strictly numeric"
        );
    }

    #[test]
    fn test_limit_message() {
        let err = PipelineError::LimitExceeded {
            plan: PlanTier::Basic,
            limit: 100,
            actual: 101,
        };
        assert_eq!(
            err.to_string(),
            "Invoice limit exceeded for your current plan (BASIC). Limit: 100, Uploaded: 101"
        );
    }
}
