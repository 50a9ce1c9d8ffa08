use thiserror::Error;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures surfaced to callers of the letter service, each carrying the
/// HTTP-style status the server reports.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("RAG system not initialized")]
    NotReady,

    #[error("{0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotReady => 503,
            ServiceError::NotFound(_) => 404,
            ServiceError::InvalidInput(_) => 422,
            ServiceError::Internal(_) => 500,
        }
    }

    pub fn case_not_found() -> Self {
        ServiceError::NotFound("Case not found".to_string())
    }
}
