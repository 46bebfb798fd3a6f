//! Session store traits

use async_trait::async_trait;
use salvo_core::{Depot, Request};
use std::sync::Arc;

use crate::error::SessionError;
use crate::session::{MaxAge, SessionData};

/// Trait for external session storage backends
///
/// The payload handed to `set` already carries the `_expire`/`_maxAge`/`_session`
/// markers; stores persist it as-is and return it unchanged from `get`.
/// Errors are not swallowed by the middleware: they fail the request.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a session by identifier
    ///
    /// Returns None if the session doesn't exist
    async fn get(&self, key: &str, max_age: MaxAge) -> Result<Option<SessionData>, SessionError>;

    /// Create or replace a session
    async fn set(&self, key: &str, data: &SessionData, max_age: MaxAge) -> Result<(), SessionError>;

    /// Destroy/delete a session
    async fn destroy(&self, key: &str) -> Result<(), SessionError>;
}

/// Builds a store for a single request.
///
/// Use this when the backend depends on the request itself (tenant routing,
/// per-request connections). It takes precedence over a global store.
pub trait ContextStore: Send + Sync + 'static {
    /// Create the store used by this request
    fn create(&self, req: &Request, depot: &Depot) -> Arc<dyn SessionStore>;
}

impl<F> ContextStore for F
where
    F: Fn(&Request, &Depot) -> Arc<dyn SessionStore> + Send + Sync + 'static,
{
    fn create(&self, req: &Request, depot: &Depot) -> Arc<dyn SessionStore> {
        self(req, depot)
    }
}
