//! Engine error types.
//!
//! "Video not analyzed yet" is never an error here; it travels as
//! `Ok(None)` through the builder and reader.

use thiserror::Error;

use pitchside_cache::CacheError;
use pitchside_firestore::FirestoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Durable store error: {0}")]
    DurableStore(#[from] FirestoreError),

    #[error("Cache store error: {0}")]
    CacheStore(#[from] CacheError),
}

impl EngineError {
    /// Whether the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DurableStore(e) => e.is_retryable(),
            Self::CacheStore(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durable_retryability_passes_through() {
        let err = EngineError::from(FirestoreError::ServerError(503, "unavailable".to_string()));
        assert!(err.is_retryable());

        let err = EngineError::from(FirestoreError::NotFound("videos/x".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_corrupt_cache_is_not_retryable() {
        let err = EngineError::from(CacheError::corrupt_snapshot("missing field"));
        assert!(!err.is_retryable());
    }
}
