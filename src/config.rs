//! Session configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::codec::{Base64JsonCodec, SessionCodec};
use crate::error::SessionError;
use crate::external_key::ExternalKey;
use crate::session::MaxAge;
use crate::store::{ContextStore, SessionStore};

/// Generates identifiers for new store-backed sessions
pub type GenId = Arc<dyn Fn() -> String + Send + Sync>;

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

/// Configuration for the session middleware
///
/// Cloned into every request, so per-request changes (such as a new
/// `maxAge`) never leak into other requests.
#[derive(Clone)]
pub struct SessionConfig {
    /// Name of the session cookie (default: "koa.sess")
    pub key: String,

    /// Session lifetime (default: session-scoped)
    pub max_age: MaxAge,

    /// Replace a same-name cookie already set on the response (default: true)
    pub overwrite: bool,

    /// HttpOnly flag for cookie (default: true)
    pub http_only: bool,

    /// Sign the cookie with a companion `.sig` cookie (default: true)
    pub signed: bool,

    /// SameSite attribute, omitted when None (default: None)
    pub same_site: Option<SameSite>,

    /// Cookie path (default: "/")
    pub path: String,

    /// Cookie domain (default: None - current domain only)
    pub domain: Option<String>,

    /// Secure flag for cookie (default: false)
    pub secure: bool,

    /// Commit at the end of every request (default: true)
    pub auto_commit: bool,

    /// Persist unchanged, populated sessions on every request to push expiry forward (default: false)
    pub rolling: bool,

    /// Keys for signing cookies.
    /// The first key signs new cookies, all keys are tried when verifying.
    pub keys: Vec<String>,

    /// External store; when set the cookie only carries an identifier
    pub store: Option<Arc<dyn SessionStore>>,

    /// Alternate channel for the store identifier
    pub external_key: Option<Arc<dyn ExternalKey>>,

    /// Per-request store factory, takes precedence over `store`
    pub context_store: Option<Arc<dyn ContextStore>>,

    /// Custom identifier generator
    pub genid: Option<GenId>,

    /// Prefix for identifiers produced by the default generator
    pub prefix: Option<String>,

    /// Codec for cookie-embedded payloads
    pub codec: Arc<dyn SessionCodec>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: "koa.sess".to_string(),
            max_age: MaxAge::Session,
            overwrite: true,
            http_only: true,
            signed: true,
            same_site: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            auto_commit: true,
            rolling: false,
            keys: Vec::new(),
            store: None,
            external_key: None,
            context_store: None,
            genid: None,
            prefix: None,
            codec: Arc::new(Base64JsonCodec),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("key", &self.key)
            .field("max_age", &self.max_age)
            .field("overwrite", &self.overwrite)
            .field("http_only", &self.http_only)
            .field("signed", &self.signed)
            .field("same_site", &self.same_site)
            .field("path", &self.path)
            .field("domain", &self.domain)
            .field("secure", &self.secure)
            .field("auto_commit", &self.auto_commit)
            .field("rolling", &self.rolling)
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("store", &self.store.is_some())
            .field("external_key", &self.external_key.is_some())
            .field("context_store", &self.context_store.is_some())
            .field("genid", &self.genid.is_some())
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Create a new session configuration signing cookies with the given key
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            keys: vec![key.into()],
            ..Default::default()
        }
    }

    /// Create a new session configuration with multiple signing keys for rotation
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(|s| s.into()).collect(),
            ..Default::default()
        }
    }

    /// Set the cookie name (default: "koa.sess")
    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = key.into();
        self
    }

    /// Set the session lifetime
    pub fn with_max_age(mut self, max_age: impl Into<MaxAge>) -> Self {
        self.max_age = max_age.into();
        self
    }

    /// Set the session lifetime in seconds
    pub fn with_max_age_secs(mut self, secs: u64) -> Self {
        self.max_age = MaxAge::Duration(Duration::from_secs(secs));
        self
    }

    /// Set whether a same-name cookie on the response is replaced (default: true)
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set whether the cookie is signed (default: true)
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Set the SameSite attribute (default: omitted)
    pub fn with_same_site(mut self, same_site: impl Into<Option<SameSite>>) -> Self {
        self.same_site = same_site.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set whether sessions are committed automatically (default: true)
    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Set whether unchanged sessions are re-persisted on every request (default: false)
    pub fn with_rolling(mut self, rolling: bool) -> Self {
        self.rolling = rolling;
        self
    }

    /// Keep session payloads in an external store
    pub fn with_store(mut self, store: impl SessionStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Carry the store identifier outside the session cookie
    pub fn with_external_key(mut self, external_key: impl ExternalKey) -> Self {
        self.external_key = Some(Arc::new(external_key));
        self
    }

    /// Build the store per request
    pub fn with_context_store(mut self, context_store: impl ContextStore) -> Self {
        self.context_store = Some(Arc::new(context_store));
        self
    }

    /// Use a custom identifier generator
    pub fn with_genid<F>(mut self, genid: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.genid = Some(Arc::new(genid));
        self
    }

    /// Prefix identifiers produced by the default generator
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Use a custom codec for cookie-embedded payloads
    pub fn with_codec(mut self, codec: impl SessionCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Check if sessions are persisted outside the cookie
    pub fn has_store(&self) -> bool {
        self.store.is_some() || self.context_store.is_some()
    }

    /// Generate an identifier for a new store-backed session
    pub fn generate_id(&self) -> String {
        match (&self.genid, &self.prefix) {
            (Some(genid), _) => genid(),
            (None, Some(prefix)) => format!("{}{}", prefix, Uuid::new_v4()),
            (None, None) => Uuid::new_v4().to_string(),
        }
    }

    /// Reject configurations that cannot serve a request
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.key.is_empty() {
            return Err(SessionError::Config("cookie key must not be empty".to_string()));
        }
        if self.signed && self.keys.is_empty() {
            return Err(SessionError::Config(
                "signed cookies require at least one signing key".to_string(),
            ));
        }
        if self.external_key.is_some() && !self.has_store() {
            return Err(SessionError::Config(
                "an external key needs a store or a context store".to_string(),
            ));
        }
        Ok(())
    }
}
