//! Session error types

/// Errors that can occur during session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Error from the session store
    #[error("session store error: {0}")]
    Store(String),

    /// Error during serialization/deserialization
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid middleware configuration, raised before any request is served
    #[error("invalid session configuration: {0}")]
    Config(String),

    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}
