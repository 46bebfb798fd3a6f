//! Per-request session orchestration
//!
//! A [`SessionContext`] owns the single [`Session`] of a request. It loads
//! prior state from the cookie or the external store, decides at commit time
//! whether anything has to be persisted, and writes the cookie and/or the
//! store accordingly.
//!
//! Commit rules, evaluated once the handler chain has run:
//!
//! - a session that existed before the request and is now empty is
//!   destroyed: store entry deleted, cookie cleared;
//! - a session is saved when it is new and populated, when a save was
//!   forced (`save()`, `set_max_age()`, wholesale replacement), when its
//!   payload differs from the snapshot taken at load, or when `rolling` is on;
//! - anything else is left untouched.
//!
//! A successful commit becomes the new baseline, so committing again in the
//! same request only writes what changed since.

use salvo_core::http::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use salvo_core::http::cookie::{self, Cookie};
use salvo_core::{Depot, Request, Response};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::{SameSite, SessionConfig};
use crate::cookie_signature::{sign, signature_cookie_name, verify};
use crate::error::SessionError;
use crate::session::{MaxAge, Session, SessionData, EXPIRE_KEY, MAX_AGE_KEY, SESSION_SCOPED_KEY};
use crate::store::SessionStore;

/// Why a session was persisted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveReason {
    /// First persistence of a populated session
    New,
    /// `save()`, `set_max_age()` or a wholesale replacement
    Forced,
    /// Payload differs from what was loaded
    Changed,
    /// Unchanged, re-persisted to extend its expiry
    Rolling,
}

/// What a commit did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing written
    Skipped,
    /// Cookie and/or store written
    Saved(SaveReason),
    /// Store entry deleted and cookie cleared
    Destroyed,
}

/// The session state of one request
pub struct SessionContext {
    opts: SessionConfig,
    store: Option<Arc<dyn SessionStore>>,
    /// Verified cookie value, cookie-embedded mode only
    cookie: Option<String>,
    /// Store identifier sent by the client or generated on save
    external_key: Option<String>,
    session: Option<Session>,
    /// Payload as loaded, the baseline for change detection
    prev: Option<SessionData>,
}

impl SessionContext {
    /// Capture what the request carries. Nothing is decoded or fetched yet.
    pub fn from_request(config: &SessionConfig, req: &Request, depot: &Depot) -> Self {
        let store = match &config.context_store {
            Some(factory) => Some(factory.create(req, depot)),
            None => config.store.clone(),
        };

        let (cookie, external_key) = match (&store, &config.external_key) {
            (None, _) => (read_cookie(req, config), None),
            (Some(_), Some(accessor)) => (None, accessor.get(req)),
            (Some(_), None) => (None, read_cookie(req, config)),
        };

        Self {
            opts: config.clone(),
            store,
            cookie,
            external_key,
            session: None,
            prev: None,
        }
    }

    /// Resolved options for this request, `max_age` being the effective lifetime
    pub fn options(&self) -> SessionConfig {
        SessionConfig {
            max_age: self.max_age(),
            ..self.opts.clone()
        }
    }

    /// Check if this request persists its session in a store
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Store identifier of the session, if one is known
    pub fn external_key(&self) -> Option<&str> {
        self.external_key.as_deref()
    }

    /// Effective lifetime: the session's if materialized, the configured one otherwise
    pub fn max_age(&self) -> MaxAge {
        self.session
            .as_ref()
            .map_or(self.opts.max_age, Session::max_age)
    }

    /// Change the lifetime of this request's session, forcing it to be saved
    pub fn set_max_age(&mut self, max_age: impl Into<MaxAge>) {
        let max_age = max_age.into();
        self.opts.max_age = max_age;
        self.session_mut().set_max_age(max_age);
    }

    /// Load the session from the store. Must run before handlers see the session.
    ///
    /// Store errors are returned to the caller, a missing or lapsed entry
    /// yields a new empty session.
    pub async fn init_from_external(&mut self) -> Result<(), SessionError> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };

        let Some(key) = self.external_key.clone() else {
            tracing::debug!("no session identifier on request, starting new session");
            self.create(None);
            return Ok(());
        };

        let stored = match store.get(&key, self.opts.max_age).await {
            Ok(stored) => stored,
            // a corrupted entry costs the client its session, never the request
            Err(SessionError::Serialization(e)) => {
                tracing::debug!(key = %key, "discarding undecodable stored session: {}", e);
                None
            }
            Err(e) => return Err(e),
        };
        match stored.filter(|data| is_live(data)) {
            Some(data) => {
                tracing::debug!(key = %key, "session loaded from store");
                self.create(Some(data));
            }
            None => {
                tracing::debug!(key = %key, "session missing or expired in store");
                self.create(None);
            }
        }
        Ok(())
    }

    /// The session, if something already materialized it
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The session, materializing it from the cookie on first access
    pub fn session_mut(&mut self) -> &mut Session {
        if self.session.is_none() {
            let stored = if self.store.is_none() {
                self.decode_cookie()
            } else {
                // store preload did not run, nothing to load from
                None
            };
            self.create(stored);
        }
        let max_age = self.opts.max_age;
        self.session.get_or_insert_with(|| Session::new(max_age))
    }

    /// Replace the whole session.
    ///
    /// `None` or an empty map clears it, which destroys a previously
    /// persisted session on commit. A populated map replaces the payload and
    /// forces a save.
    pub fn set_session(&mut self, data: Option<SessionData>) {
        let current = self.session_mut();
        let was_new = current.is_new();
        let max_age = current.max_age();

        let replacement = match data.filter(|d| !d.is_empty()) {
            Some(data) => {
                let mut session = Session::hydrate(data, max_age);
                session.save();
                session
            }
            None if was_new => Session::new(max_age),
            None => Session::hydrate(SessionData::new(), max_age),
        };
        self.session = Some(replacement);
    }

    /// Commit at a point chosen by the application (`auto_commit` disabled)
    pub async fn manually_commit(&mut self, res: &mut Response) -> Result<CommitOutcome, SessionError> {
        self.commit(res).await
    }

    /// Persist, destroy or leave the session depending on what happened to it
    pub async fn commit(&mut self, res: &mut Response) -> Result<CommitOutcome, SessionError> {
        let Some(session) = &self.session else {
            tracing::debug!("session never accessed, nothing to commit");
            return Ok(CommitOutcome::Skipped);
        };

        if !session.is_new() && !session.is_populated() {
            let max_age = session.max_age();
            self.remove(res).await?;
            tracing::debug!(key = ?self.external_key, "session destroyed");
            self.external_key = None;
            self.prev = None;
            self.session = Some(Session::new(max_age));
            return Ok(CommitOutcome::Destroyed);
        }

        let Some(reason) = self.save_reason(session) else {
            tracing::debug!("session unchanged, skipping commit");
            return Ok(CommitOutcome::Skipped);
        };

        self.save(res).await?;
        tracing::debug!(?reason, key = ?self.external_key, "session saved");
        Ok(CommitOutcome::Saved(reason))
    }

    fn create(&mut self, stored: Option<SessionData>) {
        let session = match stored {
            Some(data) => Session::hydrate(data, self.opts.max_age),
            None => Session::new(self.opts.max_age),
        };
        if !session.is_new() {
            self.opts.max_age = session.max_age();
            self.prev = Some(session.to_json());
        }
        self.session = Some(session);
    }

    fn decode_cookie(&self) -> Option<SessionData> {
        let raw = self.cookie.as_deref()?;
        match self.opts.codec.decode(raw) {
            Ok(data) if is_live(&data) => Some(data),
            Ok(_) => {
                tracing::debug!("session cookie expired");
                None
            }
            Err(e) => {
                tracing::debug!("discarding undecodable session cookie: {}", e);
                None
            }
        }
    }

    fn save_reason(&self, session: &Session) -> Option<SaveReason> {
        if session.requires_save() {
            return Some(SaveReason::Forced);
        }
        if session.is_new() {
            return session.is_populated().then_some(SaveReason::New);
        }
        if self.prev.as_ref() != Some(&session.to_json()) {
            return Some(SaveReason::Changed);
        }
        self.opts.rolling.then_some(SaveReason::Rolling)
    }

    async fn save(&mut self, res: &mut Response) -> Result<(), SessionError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        let max_age = session.max_age();
        let is_new = session.is_new();
        let payload = with_markers(session.to_json(), max_age);

        let Some(store) = self.store.clone() else {
            let encoded = self.opts.codec.encode(&payload)?;
            self.write_cookie(res, &encoded, max_age);
            self.mark_persisted();
            return Ok(());
        };

        let key = match self.external_key.take() {
            Some(key) if !is_new => key,
            _ => self.opts.generate_id(),
        };
        self.external_key = Some(key.clone());

        store.set(&key, &payload, max_age).await?;
        match &self.opts.external_key {
            Some(accessor) => accessor.set(res, &key),
            None => self.write_cookie(res, &key, max_age),
        }
        self.mark_persisted();
        Ok(())
    }

    /// Later commits in the same request compare against what was just written
    fn mark_persisted(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.mark_persisted();
            self.prev = Some(session.to_json());
        }
    }

    async fn remove(&self, res: &mut Response) -> Result<(), SessionError> {
        if let (Some(store), Some(key)) = (&self.store, &self.external_key) {
            store.destroy(key).await?;
        }
        self.clear_cookie(res);
        Ok(())
    }

    fn write_cookie(&self, res: &mut Response, value: &str, max_age: MaxAge) {
        let name = &self.opts.key;
        if !self.opts.overwrite && res.cookie(name).is_some() {
            tracing::debug!(cookie = %name, "cookie already set on response, not overwriting");
            return;
        }

        let mut cookie = self.cookie_template(name.clone(), value.to_string());
        if let Some(ttl) = max_age.as_duration() {
            cookie.set_max_age(CookieDuration::milliseconds(millis(ttl)));
        }
        res.add_cookie(cookie);

        if self.opts.signed {
            if let Some(key) = self.opts.keys.first() {
                let mut sig = self.cookie_template(signature_cookie_name(name), sign(name, value, key));
                if let Some(ttl) = max_age.as_duration() {
                    sig.set_max_age(CookieDuration::milliseconds(millis(ttl)));
                }
                res.add_cookie(sig);
            }
        }
    }

    fn clear_cookie(&self, res: &mut Response) {
        let mut names = vec![self.opts.key.clone()];
        if self.opts.signed {
            names.push(signature_cookie_name(&self.opts.key));
        }
        for name in names {
            let mut cookie = self.cookie_template(name, String::new());
            cookie.set_max_age(CookieDuration::ZERO);
            cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
            res.add_cookie(cookie);
        }
    }

    fn cookie_template(&self, name: String, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .path(self.opts.path.clone())
            .http_only(self.opts.http_only)
            .secure(self.opts.secure);

        if let Some(domain) = self.opts.domain.clone() {
            builder = builder.domain(domain);
        }

        if let Some(same_site) = self.opts.same_site {
            builder = builder.same_site(match same_site {
                SameSite::Strict => cookie::SameSite::Strict,
                SameSite::Lax => cookie::SameSite::Lax,
                SameSite::None => cookie::SameSite::None,
            });
        }

        builder.build()
    }
}

/// Read the session cookie, verifying its signature when configured
fn read_cookie(req: &Request, opts: &SessionConfig) -> Option<String> {
    let value = req.cookie(&opts.key)?.value();
    if value.is_empty() {
        return None;
    }

    if opts.signed {
        let sig_name = signature_cookie_name(&opts.key);
        let Some(sig) = req.cookie(&sig_name) else {
            tracing::debug!(cookie = %opts.key, "signed session cookie without signature");
            return None;
        };
        if verify(&opts.key, value, sig.value(), &opts.keys).is_none() {
            tracing::debug!(cookie = %opts.key, "session cookie signature mismatch");
            return None;
        }
    }

    Some(value.to_string())
}

/// Add the expiry markers restored by [`Session::hydrate`] on the next load
fn with_markers(mut payload: SessionData, max_age: MaxAge) -> SessionData {
    match max_age {
        MaxAge::Session => {
            payload.insert(SESSION_SCOPED_KEY.to_string(), Value::Bool(true));
        }
        MaxAge::Duration(ttl) => {
            let ttl_ms = millis(ttl);
            let now = chrono::Utc::now().timestamp_millis();
            payload.insert(EXPIRE_KEY.to_string(), json!(now.saturating_add(ttl_ms)));
            payload.insert(MAX_AGE_KEY.to_string(), json!(ttl_ms));
        }
    }
    payload
}

/// Milliseconds in `d`, clamped to what a cookie or an epoch timestamp can hold
fn millis(d: std::time::Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// A payload is live unless its `_expire` marker lies in the past
fn is_live(data: &SessionData) -> bool {
    match data.get(EXPIRE_KEY).and_then(Value::as_f64) {
        Some(expire) => expire >= chrono::Utc::now().timestamp_millis() as f64,
        None => true,
    }
}
