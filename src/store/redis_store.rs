//! Redis session store
//!
//! - Key: `prefix + session identifier` (default prefix: "koa:sess:")
//! - Value: JSON serialized session payload
//! - TTL: the session's `maxAge`, or the default TTL for session-scoped sessions

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

use super::SessionStore;
use crate::error::SessionError;
use crate::session::{MaxAge, SessionData};

/// Redis session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_koa_session::RedisStore;
///
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(client).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
    prefix: String,
    default_ttl: u64,
}

impl RedisStore {
    /// Create a new Redis store with default settings
    ///
    /// - Prefix: "koa:sess:"
    /// - Default TTL: 86400 seconds (1 day)
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::Store(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "koa:sess:".to_string(),
            default_ttl: 86400,
        }
    }

    /// Build with custom prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Build with custom default TTL, used for session-scoped sessions
    pub fn with_default_ttl(mut self, ttl: u64) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Make a storage key from session identifier
    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// TTL in seconds for a given `maxAge`, rounded up so short lifetimes survive
fn ttl_secs(max_age: MaxAge, default_ttl: u64) -> u64 {
    match max_age.as_duration() {
        Some(d) => u64::try_from(d.as_millis().div_ceil(1000)).unwrap_or(u64::MAX),
        None => default_ttl,
    }
}

/// Decode a stored payload. A value that is not a session reads as absent.
fn parse_stored(key: &str, json: &str) -> Option<SessionData> {
    match serde_json::from_str(json) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::debug!(key = %key, "ignoring undecodable session entry: {}", e);
            None
        }
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, key: &str, _max_age: MaxAge) -> Result<Option<SessionData>, SessionError> {
        let key = self.make_key(key);
        let mut conn = (*self.conn).clone();

        let data: Option<String> = conn.get(&key).await?;

        match data {
            Some(json) => Ok(parse_stored(&key, &json)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, data: &SessionData, max_age: MaxAge) -> Result<(), SessionError> {
        let key = self.make_key(key);
        let mut conn = (*self.conn).clone();

        let json = serde_json::to_string(data)?;
        let ttl = ttl_secs(max_age, self.default_ttl);

        if ttl > 0 {
            conn.set_ex::<_, _, ()>(&key, &json, ttl).await?;
        } else {
            // A zero lifetime means the session is already gone
            conn.del::<_, ()>(&key).await?;
        }

        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<(), SessionError> {
        let key = self.make_key(key);
        let mut conn = (*self.conn).clone();

        conn.del::<_, ()>(&key).await?;
        Ok(())
    }
}
