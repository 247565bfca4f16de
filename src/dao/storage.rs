use std::error::Error;
use thiserror::Error;

/// Result alias for room store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error surfaced by room store backends. The bundled in-memory store never
/// fails, but the trait keeps the error channel open for remote backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("room store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}
