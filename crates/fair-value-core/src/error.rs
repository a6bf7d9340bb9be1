use thiserror::Error;

#[derive(Debug, Error)]
pub enum FairValueError {
    #[error("Missing input: {field}")]
    MissingInput { field: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Numeric overflow in {context}")]
    NumericOverflow { context: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FairValueError {
    /// True for the failures `evaluate` folds into an empty result.
    pub fn is_input_failure(&self) -> bool {
        matches!(
            self,
            FairValueError::MissingInput { .. }
                | FairValueError::InvalidInput { .. }
                | FairValueError::InvalidDomain(_)
                | FairValueError::DivisionByZero { .. }
                | FairValueError::NumericOverflow { .. }
        )
    }
}

impl From<serde_json::Error> for FairValueError {
    fn from(e: serde_json::Error) -> Self {
        FairValueError::SerializationError(e.to_string())
    }
}
