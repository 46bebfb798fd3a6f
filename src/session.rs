//! Session entity: the per-request payload plus its lifecycle flags

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::SessionError;

/// Serializable session payload
pub type SessionData = HashMap<String, Value>;

/// Reserved payload key holding the epoch millisecond at which a persisted session lapses
pub const EXPIRE_KEY: &str = "_expire";

/// Reserved payload key holding an explicit `maxAge` in milliseconds
pub const MAX_AGE_KEY: &str = "_maxAge";

/// Reserved payload key marking a session-scoped `maxAge`
pub const SESSION_SCOPED_KEY: &str = "_session";

/// Bookkeeping key that is never persisted
const IS_NEW_KEY: &str = "isNew";

/// How long a session lives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxAge {
    /// No explicit expiry: the cookie is dropped when the browser session ends
    #[default]
    Session,
    /// Fixed lifetime
    Duration(Duration),
}

impl MaxAge {
    /// Build from a millisecond count
    pub fn from_millis(ms: u64) -> Self {
        MaxAge::Duration(Duration::from_millis(ms))
    }

    /// The lifetime, `None` when session-scoped
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            MaxAge::Session => None,
            MaxAge::Duration(d) => Some(*d),
        }
    }

    /// Check whether this is the session-scoped sentinel
    pub fn is_session(&self) -> bool {
        matches!(self, MaxAge::Session)
    }
}

impl From<Duration> for MaxAge {
    fn from(d: Duration) -> Self {
        MaxAge::Duration(d)
    }
}

impl From<Option<Duration>> for MaxAge {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(MaxAge::Session, MaxAge::Duration)
    }
}

/// Keys starting with `_` are bookkeeping and never leave the process as payload
fn is_reserved(key: &str) -> bool {
    key.starts_with('_') || key == IS_NEW_KEY
}

/// The session exposed to handlers.
///
/// Created by [`SessionContext`](crate::context::SessionContext) once per
/// request, either empty (`is_new`) or hydrated from a persisted payload.
#[derive(Clone, Debug)]
pub struct Session {
    data: SessionData,
    is_new: bool,
    require_save: bool,
    max_age: MaxAge,
}

impl Session {
    /// Empty session for a client that carried no usable state
    pub(crate) fn new(max_age: MaxAge) -> Self {
        Self {
            data: SessionData::new(),
            is_new: true,
            require_save: false,
            max_age,
        }
    }

    /// Session restored from a persisted payload.
    ///
    /// `_maxAge` and `_session` markers override `max_age`; they are
    /// consumed here and never show up as payload fields.
    pub(crate) fn hydrate(stored: SessionData, max_age: MaxAge) -> Self {
        let mut session = Self {
            data: SessionData::with_capacity(stored.len()),
            is_new: false,
            require_save: false,
            max_age,
        };

        for (key, value) in stored {
            match key.as_str() {
                MAX_AGE_KEY => {
                    if let Some(ms) = value.as_u64() {
                        session.max_age = MaxAge::from_millis(ms);
                    }
                }
                SESSION_SCOPED_KEY => session.max_age = MaxAge::Session,
                _ => {
                    session.data.insert(key, value);
                }
            }
        }

        session
    }

    /// Check if no prior state was found for this request
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Get a value from the session
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw JSON value for a key
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Mutable access to a raw value, for in-place edits of nested structures.
    ///
    /// Edits made this way are still picked up by the commit-time comparison.
    pub fn get_value_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Set a value in the session
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Drop every payload field
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Payload without bookkeeping keys, as persisted and compared
    pub fn to_json(&self) -> SessionData {
        self.data
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of persistable fields
    pub fn len(&self) -> usize {
        self.data.keys().filter(|key| !is_reserved(key)).count()
    }

    /// Check if the session holds no persistable field
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the session holds at least one persistable field
    pub fn is_populated(&self) -> bool {
        !self.is_empty()
    }

    /// Resolved lifetime of this session
    pub fn max_age(&self) -> MaxAge {
        self.max_age
    }

    /// Change the lifetime. Always forces the session to be persisted again.
    pub fn set_max_age(&mut self, max_age: impl Into<MaxAge>) {
        self.max_age = max_age.into();
        self.require_save = true;
    }

    /// Persist this session on commit even if nothing seems to have changed
    pub fn save(&mut self) {
        self.require_save = true;
    }

    /// Check if a save was forced via [`Session::save`] or [`Session::set_max_age`]
    pub fn requires_save(&self) -> bool {
        self.require_save
    }

    /// The session now exists on the client and/or in the store
    pub(crate) fn mark_persisted(&mut self) {
        self.is_new = false;
        self.require_save = false;
    }
}
