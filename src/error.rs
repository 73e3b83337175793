use thiserror::Error;

/// Failures surfaced by the persistence and file-import paths.
///
/// The practice engine itself never fails: empty lists and stale answers are
/// handled by ignoring or redirecting the request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("sentence serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
