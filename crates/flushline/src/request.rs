use std::sync::Arc;

use crate::handler::HandlerConfig;
use crate::response::Response;
use crate::session::RenderSession;
use crate::snapshot::{
    Flash, FlashAccess, FlashStore, MemoryFlash, SessionTokens, TokenAccess, TokenStore,
};

/// Everything one request needs to render: the session, the client's
/// user agent, and the response being built.
///
/// Create one per request and drop it with the request. Nothing in it is
/// shared with other requests.
#[derive(Debug)]
pub struct RequestScope {
    session: RenderSession,
    user_agent: Option<String>,
    response: Response,
}

impl RequestScope {
    /// A scope with an empty in-memory flash and a fresh token store.
    pub fn new(handler: Arc<HandlerConfig>, action: impl Into<String>) -> Self {
        let flash = FlashAccess::new(Arc::new(MemoryFlash::default()));
        let token = TokenAccess::new(Arc::new(SessionTokens::new()));
        Self {
            session: RenderSession::new(handler, action, flash, token),
            user_agent: None,
            response: Response::new(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_flash(mut self, store: Arc<dyn FlashStore>) -> Self {
        self.session.set_flash(FlashAccess::new(store));
        self
    }

    pub fn with_tokens(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.session.set_token(TokenAccess::new(store));
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut RenderSession {
        &mut self.session
    }

    /// Read the flash the way view code does: from the streaming snapshot
    /// when one exists, destructively otherwise.
    pub fn flash(&self) -> Flash {
        self.session.flash().read()
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
