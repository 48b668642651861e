use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("SYNTHESIS_FAILED: {0}")]
    Synthesis(String),
    #[error("QUERY_FAILED: {0}")]
    Query(String),
    #[error("QUERY_CLASSIFIED: {0}")]
    ClassifiedQuery(String),
    #[error("QUERY_UNCLASSIFIED: {0}")]
    UnclassifiedQuery(String),
    #[error("PERSISTENCE_FAILURE: {0}")]
    Persistence(String),
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    /// The message without its code prefix, as reported by the collaborator.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::Synthesis(message)
            | Self::Query(message)
            | Self::ClassifiedQuery(message)
            | Self::UnclassifiedQuery(message)
            | Self::Persistence(message)
            | Self::InvalidInput(message)
            | Self::Io(message)
            | Self::Internal(message) => message,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
