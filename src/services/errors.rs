use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid annotation: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Annotation is not for a group submission")]
    NotGroupSubmission,
    #[error("invalid group: {0}")]
    InvalidGroup(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}
