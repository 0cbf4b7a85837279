//! Per-request render state.
//!
//! A [`RenderSession`] lives for one request. It tracks render nesting
//! depth, the layout content callback currently in effect, content for the
//! layout slot and named regions, and the request's flash and token access.
//! Depth and callback follow stack discipline: whoever changes them restores
//! the previous value on every exit path.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RenderResult;
use crate::handler::HandlerConfig;
use crate::snapshot::{FlashAccess, TokenAccess};
use crate::view::ViewContext;

/// What a layout asks its content callback for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRequest<'n> {
    /// The inner content of the layout.
    Main,
    /// A named region filled earlier with `content_for`.
    Named(&'n str),
}

/// Callback a layout invokes when it reaches a content slot.
pub type ContentProc =
    Arc<dyn Fn(&mut ViewContext<'_>, ContentRequest<'_>) -> RenderResult<()> + Send + Sync>;

pub struct RenderSession {
    handler: Arc<HandlerConfig>,
    action: String,
    depth: usize,
    streaming: bool,
    pub(crate) content_proc: Option<ContentProc>,
    pub(crate) layout_content: Option<String>,
    named_content: HashMap<String, String>,
    flash: FlashAccess,
    token: TokenAccess,
}

impl RenderSession {
    pub fn new(
        handler: Arc<HandlerConfig>,
        action: impl Into<String>,
        flash: FlashAccess,
        token: TokenAccess,
    ) -> Self {
        Self {
            handler,
            action: action.into(),
            depth: 0,
            streaming: false,
            content_proc: None,
            layout_content: None,
            named_content: HashMap::new(),
            flash,
            token,
        }
    }

    /// A fresh session for a streaming producer.
    ///
    /// Shares the handler and the flash/token snapshots; depth and layout
    /// state start empty.
    pub(crate) fn detach(&self) -> Self {
        let mut session = Self::new(
            Arc::clone(&self.handler),
            self.action.clone(),
            self.flash.clone(),
            self.token.clone(),
        );
        session.streaming = true;
        session
    }

    pub fn handler(&self) -> &HandlerConfig {
        &self.handler
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Current render nesting depth. Zero outside any render.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` inside a streaming producer.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn flash(&self) -> &FlashAccess {
        &self.flash
    }

    pub fn token(&self) -> &TokenAccess {
        &self.token
    }

    pub(crate) fn set_flash(&mut self, flash: FlashAccess) {
        self.flash = flash;
    }

    pub(crate) fn set_token(&mut self, token: TokenAccess) {
        self.token = token;
    }

    /// Enter a render call and return the new depth.
    pub(crate) fn enter(&mut self) -> usize {
        self.depth += 1;
        self.depth
    }

    pub(crate) fn leave(&mut self) {
        debug_assert!(self.depth > 0, "render depth underflow");
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn has_content_proc(&self) -> bool {
        self.content_proc.is_some()
    }

    pub fn content_for(&self, name: &str) -> Option<&str> {
        self.named_content.get(name).map(String::as_str)
    }

    pub(crate) fn append_content(&mut self, name: &str, content: &str) {
        self.named_content
            .entry(name.to_string())
            .or_default()
            .push_str(content);
    }
}

impl fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("handler", &self.handler.name())
            .field("action", &self.action)
            .field("depth", &self.depth)
            .field("streaming", &self.streaming)
            .field("content_proc", &self.content_proc.is_some())
            .field("named_content", &self.named_content.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MemoryFlash, SessionTokens};

    fn session() -> RenderSession {
        RenderSession::new(
            Arc::new(HandlerConfig::new("posts")),
            "index",
            FlashAccess::new(Arc::new(MemoryFlash::with("notice", "hi"))),
            TokenAccess::new(Arc::new(SessionTokens::new())),
        )
    }

    #[test]
    fn depth_tracks_enter_and_leave() {
        let mut session = session();
        assert_eq!(session.enter(), 1);
        assert_eq!(session.enter(), 2);
        session.leave();
        session.leave();
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn named_content_accumulates() {
        let mut session = session();
        session.append_content("sidebar", "<li>a</li>");
        session.append_content("sidebar", "<li>b</li>");
        assert_eq!(session.content_for("sidebar"), Some("<li>a</li><li>b</li>"));
        assert_eq!(session.content_for("footer"), None);
    }

    #[test]
    fn detached_session_shares_snapshots() {
        let mut outer = session();
        outer.enter();
        outer.flash().take_snapshot();

        let inner = outer.detach();
        assert_eq!(inner.depth(), 0);
        assert!(inner.is_streaming());
        assert!(inner.flash().is_snapshotted());
        assert_eq!(inner.flash().read().get("notice").map(String::as_str), Some("hi"));
    }
}
