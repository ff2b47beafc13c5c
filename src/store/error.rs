use thiserror::Error;

/// Failure of a persistence operation.
///
/// `NotFound`, `Conflict` and `Invalid` are expected outcomes the caller can
/// act on. `Storage` wraps everything the backend itself failed at.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("invalid {0}")]
    Invalid(String),

    #[error("failed to {operation} {id}: {source:#}")]
    Storage {
        operation: &'static str,
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn tournament_not_found(id: &str) -> Self {
        StoreError::NotFound(format!("tournament {}", id))
    }

    pub fn round_not_found(round_number: u32) -> Self {
        StoreError::NotFound(format!("round {}", round_number))
    }

    pub fn match_not_found(match_id: &str, round_number: u32) -> Self {
        StoreError::NotFound(format!("match {} in round {}", match_id, round_number))
    }

    pub fn user_not_found(email: &str) -> Self {
        StoreError::NotFound(format!("user {}", email))
    }

    pub fn storage(operation: &'static str, id: &str, source: impl Into<anyhow::Error>) -> Self {
        StoreError::Storage {
            operation,
            id: id.to_string(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, StoreError::Invalid(_))
    }
}

/// Tags a backend failure with the operation and record it concerned
pub trait StorageContext<T> {
    fn storage(self, operation: &'static str, id: &str) -> StoreResult<T>;
}

impl<T, E> StorageContext<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn storage(self, operation: &'static str, id: &str) -> StoreResult<T> {
        self.map_err(|e| StoreError::storage(operation, id, e))
    }
}
