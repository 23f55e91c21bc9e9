use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapmError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CapmError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CapmError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CapmError {
    fn from(e: serde_json::Error) -> Self {
        CapmError::SerializationError(e.to_string())
    }
}
