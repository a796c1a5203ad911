//! Error types for threadline domain values.

use thiserror::Error;

/// Errors raised while building or decoding domain values.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A required field was missing or empty
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A field was present but could not be interpreted
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
