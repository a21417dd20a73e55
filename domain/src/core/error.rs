//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Invalid status flag: {0}")]
    InvalidStatus(String),

    #[error("Conflicting status flags: {0} and {1}")]
    ConflictingStatus(String, String),

    #[error("No command template found for tool '{0}'")]
    TemplateNotFound(String),

    #[error("Invalid timestamp '{value}' in field {field}")]
    InvalidTimestamp { field: String, value: String },
}

impl DomainError {
    /// Check if this error comes from rejecting input vocabulary
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidLevel(_)
                | DomainError::InvalidStatus(_)
                | DomainError::ConflictingStatus(_, _)
                | DomainError::InvalidTimestamp { .. }
        )
    }
}
