use chrono::{DateTime, Utc};
use sea_orm::DbErr;

/// Errors surfaced by the directory services (artists, venues, availability).
///
/// `NotFound`, `HasDependentShows`, `InvalidWindow` and `MissingField` are
/// client errors; only `Storage` is a server fault.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{entity} {id} has {count} show(s) and cannot be deleted")]
    HasDependentShows {
        entity: &'static str,
        id: i64,
        count: u64,
    },
    #[error("availability window must start before it ends ({start} >= {end})")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

impl DirectoryError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DirectoryError::Storage(_))
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
