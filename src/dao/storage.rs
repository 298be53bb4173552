use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        #[source]
        /// Backend-specific cause.
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored tournament could not be decoded.
    #[error("stored tournament `{id}` is unreadable: {reason}")]
    Corrupted {
        /// Tournament identifier.
        id: Uuid,
        /// What was wrong with the document.
        reason: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
