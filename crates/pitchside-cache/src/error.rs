//! Cache error types.

use std::time::Duration;

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Corrupt snapshot in cache: {0}")]
    CorruptSnapshot(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn corrupt_snapshot(msg: impl Into<String>) -> Self {
        Self::CorruptSnapshot(msg.into())
    }

    /// Whether the failure is transient and worth retrying upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::Redis(_)
        )
    }
}
