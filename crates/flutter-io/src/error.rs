//! Error types for flutter-io

use flutter_model::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BulkDataError>;

/// A value that cannot be represented in a fixed 8-character field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("{card}: value '{value}' does not fit an 8-character field")]
    FieldOverflow { card: String, value: String },

    #[error("{card}: non-finite real value {value}")]
    NonFinite { card: String, value: f64 },

    #[error("card name '{0}' does not fit an 8-character field")]
    CardName(String),
}

impl EncodingError {
    /// Attaches the card name to an error raised while encoding one field.
    pub fn in_card(self, name: &str) -> Self {
        match self {
            EncodingError::FieldOverflow { value, .. } => EncodingError::FieldOverflow {
                card: name.to_string(),
                value,
            },
            EncodingError::NonFinite { value, .. } => EncodingError::NonFinite {
                card: name.to_string(),
                value,
            },
            other => other,
        }
    }
}

#[derive(Error, Debug)]
pub enum BulkDataError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("No boundary constraints were generated; the panel would be unrestrained")]
    NoConstraints,

    #[error("Invalid bulk-data configuration: {0}")]
    Config(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
