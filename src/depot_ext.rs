//! Extension trait for Depot to easily access sessions

use async_trait::async_trait;
use salvo_core::{Depot, Response};

use crate::config::SessionConfig;
use crate::context::{CommitOutcome, SessionContext};
use crate::error::SessionError;
use crate::session::{Session, SessionData};

pub(crate) const SESSION_KEY: &str = "salvo.koa.session";

/// Extension trait for Salvo's Depot to provide easy session access
#[async_trait]
pub trait SessionDepotExt {
    /// The session context of this request
    fn session_context(&self) -> Option<&SessionContext>;

    /// Mutable session context of this request
    fn session_context_mut(&mut self) -> Option<&mut SessionContext>;

    /// The session, loaded on first access
    fn session_mut(&mut self) -> Option<&mut Session>;

    /// Replace the whole session; `None` or an empty map clears it
    fn set_session(&mut self, data: Option<SessionData>) -> bool;

    /// Resolved session options for this request
    fn session_options(&self) -> Option<SessionConfig>;

    /// Commit now, for applications that disabled `auto_commit`
    async fn commit_session(&mut self, res: &mut Response) -> Result<CommitOutcome, SessionError>;
}

#[async_trait]
impl SessionDepotExt for Depot {
    fn session_context(&self) -> Option<&SessionContext> {
        self.get::<SessionContext>(SESSION_KEY).ok()
    }

    fn session_context_mut(&mut self) -> Option<&mut SessionContext> {
        self.get_mut::<SessionContext>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        self.session_context_mut().map(SessionContext::session_mut)
    }

    fn set_session(&mut self, data: Option<SessionData>) -> bool {
        match self.session_context_mut() {
            Some(ctx) => {
                ctx.set_session(data);
                true
            }
            None => false,
        }
    }

    fn session_options(&self) -> Option<SessionConfig> {
        self.session_context().map(SessionContext::options)
    }

    async fn commit_session(&mut self, res: &mut Response) -> Result<CommitOutcome, SessionError> {
        match self.session_context_mut() {
            Some(ctx) => ctx.manually_commit(res).await,
            None => Ok(CommitOutcome::Skipped),
        }
    }
}
