//! Session middleware handler for Salvo

use salvo_core::prelude::*;

use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::depot_ext::SESSION_KEY;
use crate::error::SessionError;

/// Session middleware for Salvo
///
/// For every request it creates a [`SessionContext`] in the depot, preloads
/// the session when a store is configured, runs the rest of the chain and
/// then commits, whether the downstream handlers succeeded or not.
#[derive(Clone, Debug)]
pub struct SessionHandler {
    config: SessionConfig,
}

impl SessionHandler {
    /// Create a new session handler, rejecting unusable configurations
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        tracing::debug!(?config, "session middleware configured");
        Ok(Self { config })
    }

    /// The configuration this handler was built with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[async_trait]
impl Handler for SessionHandler {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        // one context per request, even if the middleware is mounted twice
        if depot.get::<SessionContext>(SESSION_KEY).is_err() {
            let mut ctx = SessionContext::from_request(&self.config, req, depot);
            if ctx.has_store() {
                if let Err(e) = ctx.init_from_external().await {
                    tracing::error!("Failed to load session: {}", e);
                    res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                    ctrl.skip_rest();
                    return;
                }
            }
            depot.insert(SESSION_KEY, ctx);
        }

        ctrl.call_next(req, depot, res).await;

        if !self.config.auto_commit {
            return;
        }

        let Ok(ctx) = depot.get_mut::<SessionContext>(SESSION_KEY) else {
            return;
        };
        if let Err(e) = ctx.commit(res).await {
            tracing::error!("Failed to commit session: {}", e);
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
