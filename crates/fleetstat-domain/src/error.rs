use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid status topic: {0}")]
    InvalidStatusTopic(String),

    #[error("Status not found for device: {0}")]
    StatusNotFound(String),

    #[error("Directory fetch failed: {0}")]
    DirectoryFetchFailed(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
