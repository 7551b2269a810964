pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the rule layer. Scope mismatches and absent ids both
/// map to `NotFound` so callers cannot probe for record existence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("An application for this job already exists")]
    DuplicateApplication,

    #[error("Record is referenced by dependent records")]
    HasDependents,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] BackendError),
}

/// Raw causes from the storage backends, carried behind
/// `Error::BackendUnavailable` so the taxonomy above stays closed.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            other => Error::BackendUnavailable(BackendError::Database(other)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::BackendUnavailable(BackendError::Json(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::BackendUnavailable(BackendError::Io(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::BackendUnavailable(BackendError::Http(err))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::BackendUnavailable(BackendError::Other(err))
    }
}
