//! Error types for form intake

use thiserror::Error;

use crate::domain::value_objects::FieldError;
use crate::ports::RepositoryError;

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("submission not found: {0}")]
    SubmissionNotFound(String),

    #[error("duplicate submission detected")]
    DuplicateSubmission,

    #[error("form data cannot be empty")]
    EmptySubmission,

    /// The schema definition itself is malformed (rejected at save time).
    #[error("invalid schema: {} error(s)", .0.len())]
    InvalidSchema(Vec<FieldError>),

    /// A record failed validation against a stored schema.
    #[error("validation failed: {} error(s)", .0.len())]
    ValidationFailed(Vec<FieldError>),

    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl FormsError {
    /// Field errors carried by validation-style failures.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::InvalidSchema(errors) | Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormsError>;
