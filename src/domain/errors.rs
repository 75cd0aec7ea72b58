use thiserror::Error;

/// Errors that can cross the account-store boundary.
///
/// Expected conditions (unknown id, failed authentication, protection
/// violations) are not errors: store operations report those as
/// `Ok(None)` / `Ok(false)`. `Conflict` carries a user-facing message;
/// the storage variants are the only fatal category.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
