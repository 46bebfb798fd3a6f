//! # salvo-koa-session
//!
//! Koa-session style session middleware for the Salvo web framework.
//!
//! Every request gets a lazily materialized, mutable session. It is loaded
//! from a signed cookie or from an external store keyed by an identifier,
//! and written back at the end of the request only when something actually
//! changed. Handlers never call "save" themselves.
//!
//! ## Features
//!
//! - **Cookie sessions**: the whole payload lives in a signed cookie (`koa.sess` + `koa.sess.sig`)
//! - **Store sessions**: the cookie (or a header) carries an identifier, the payload lives in a store
//! - **Change detection**: unchanged sessions cost no cookie or store writes
//! - **Sticky expiry**: a custom `maxAge` is persisted with the session and restored on the next request
//! - **Pluggable storage backends**: Redis, Memory, per-request or custom stores
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_koa_session::{SessionConfig, SessionDepotExt, SessionHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session_config = SessionConfig::new("your-signing-key").with_max_age_secs(86400);
//!     let session_handler = SessionHandler::new(session_config).unwrap();
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.set("views", views + 1).unwrap();
//!     format!("views: {}", views + 1)
//! }
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod cookie_signature;
pub mod error;
pub mod external_key;
pub mod handler;
pub mod session;
pub mod store;

pub use codec::{Base64JsonCodec, SessionCodec};
pub use config::{SameSite, SessionConfig};
pub use context::{CommitOutcome, SaveReason, SessionContext};
pub use error::SessionError;
pub use external_key::{ExternalKey, HeaderExternalKey};
pub use handler::SessionHandler;
pub use session::{MaxAge, Session, SessionData};
pub use store::{ContextStore, MemoryStore, SessionStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
