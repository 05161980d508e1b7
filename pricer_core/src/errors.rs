//! # Error Types
//!
//! Structured error types for pricer_core. Pricing itself fails soft: malformed
//! configuration is coerced to defaults and never surfaces here. These errors
//! cover the few places where failing loudly is the right call: a caller
//! omitting a required job field, admin-side config validation, and file I/O.
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::errors::{PricingError, PricingResult};
//!
//! fn require_grams(grams: Option<f64>) -> PricingResult<f64> {
//!     grams.ok_or_else(|| PricingError::missing_field("material_grams"))
//! }
//!
//! assert_eq!(require_grams(None).unwrap_err().error_code(), "MISSING_FIELD");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pricer_core operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Structured error type for pricing operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PricingError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required job field is missing (caller-contract violation)
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A configuration entry failed admin-side validation
    #[error("Invalid config at '{path}': {reason}")]
    InvalidConfig { path: String, reason: String },

    /// A fee condition uses an operator the evaluator does not know
    #[error("Unknown condition operator '{operator}' in fee '{fee_id}'")]
    UnknownOperator { fee_id: String, operator: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl PricingError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        PricingError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownOperator error
    pub fn unknown_operator(fee_id: impl Into<String>, operator: impl Into<String>) -> Self {
        PricingError::UnknownOperator {
            fee_id: fee_id.into(),
            operator: operator.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from the caller's job record rather than from configuration
    pub fn is_caller_error(&self) -> bool {
        matches!(self, PricingError::MissingField { .. } | PricingError::InvalidInput { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PricingError::InvalidInput { .. } => "INVALID_INPUT",
            PricingError::MissingField { .. } => "MISSING_FIELD",
            PricingError::InvalidConfig { .. } => "INVALID_CONFIG",
            PricingError::UnknownOperator { .. } => "UNKNOWN_OPERATOR",
            PricingError::FileError { .. } => "FILE_ERROR",
            PricingError::SerializationError { .. } => "SERIALIZATION_ERROR",
            PricingError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tagged_json() {
        let error = PricingError::missing_field("material_grams");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "MissingField");
        assert_eq!(json["details"]["field"], "material_grams");

        let roundtrip: PricingError = serde_json::from_value(json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PricingError::missing_field("x").error_code(), "MISSING_FIELD");
        assert_eq!(PricingError::unknown_operator("fee-1", "between").error_code(), "UNKNOWN_OPERATOR");
        assert_eq!(PricingError::invalid_config("rounding_step", "bad").error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_caller_errors_are_distinct_from_config_errors() {
        assert!(PricingError::missing_field("print_time_seconds").is_caller_error());
        assert!(!PricingError::invalid_config("markup_mode", "unknown").is_caller_error());
    }

    #[test]
    fn test_display_message() {
        let error = PricingError::unknown_operator("fee-7", "between");
        assert_eq!(error.to_string(), "Unknown condition operator 'between' in fee 'fee-7'");
    }
}
