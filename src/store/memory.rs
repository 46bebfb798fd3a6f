//! In-memory session store
//!
//! This is primarily for development and testing.
//! For production, use RedisStore or another persistent store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::SessionStore;
use crate::error::SessionError;
use crate::session::{MaxAge, SessionData};

struct StoredSession {
    data: SessionData,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// In-memory session store
///
/// Clones share the same underlying map.
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
/// - Memory usage grows with number of sessions
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean up expired sessions
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.sessions.write().retain(|_, stored| stored.is_live(now));
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .values()
            .filter(|stored| stored.is_live(now))
            .count()
    }

    /// Check if no live session is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str, _max_age: MaxAge) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(key)
            .filter(|stored| stored.is_live(Instant::now()))
            .map(|stored| stored.data.clone()))
    }

    async fn set(&self, key: &str, data: &SessionData, max_age: MaxAge) -> Result<(), SessionError> {
        // session-scoped entries live until destroyed or lapsed via `_expire`
        // so do lifetimes too long to represent
        let expires_at = max_age
            .as_duration()
            .and_then(|ttl| Instant::now().checked_add(ttl));

        let stored = StoredSession {
            data: data.clone(),
            expires_at,
        };

        self.sessions.write().insert(key.to_string(), stored);
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<(), SessionError> {
        self.sessions.write().remove(key);
        Ok(())
    }
}
