//! Layout inversion.
//!
//! The buffered path renders content first and then evaluates the layout
//! around it. The progressive path evaluates the layout first and installs
//! a content callback; when the layout reaches its content slot the
//! callback flushes everything the layout produced so far, renders the
//! inner content and flushes that too. Markup ahead of the slot therefore
//! reaches the client before the inner content is computed.
//!
//! The active callback is saved and restored around every layout scope.
//! Buffered renders clear it for their duration, so a nested layout's
//! content slot resolves to its own content rather than to an enclosing
//! progressive render's callback.

use std::sync::Arc;

use crate::error::RenderResult;
use crate::options::{LayoutChoice, RenderOptions, RenderTarget};
use crate::policy::ProgressiveRenderer;
use crate::session::{ContentProc, ContentRequest, RenderSession};
use crate::view::ViewContext;

impl ProgressiveRenderer {
    /// Render a call made below the top level. Options marked progressive
    /// keep the inversion for their own layout; everything else buffers.
    pub(crate) fn render_nested(&self, view: &mut ViewContext<'_>, options: &RenderOptions) -> RenderResult<()> {
        if options.progressive == Some(true) {
            self.render_progressive(view, options)
        } else {
            self.render_buffered(view, options)
        }
    }

    /// Evaluate the layout first and render content on demand.
    pub(crate) fn render_progressive(&self, view: &mut ViewContext<'_>, options: &RenderOptions) -> RenderResult<()> {
        let engine = self.engine();
        match resolve_layout(view.session(), options) {
            Some(layout) => view.with_content_proc(Some(content_proc(options)), |view| {
                engine.render_layout(view, &layout, &options.locals)
            }),
            None => view.with_content_proc(None, |view| engine.render_body(view, options)),
        }
    }

    /// Render content to a string, then evaluate the layout around it.
    pub(crate) fn render_buffered(&self, view: &mut ViewContext<'_>, options: &RenderOptions) -> RenderResult<()> {
        let engine = self.engine();
        let layout = resolve_layout(view.session(), options);
        view.with_content_proc(None, |view| match layout {
            None => engine.render_body(view, options),
            Some(layout) => {
                let mut content = String::new();
                view.with_output(&mut content, |view| engine.render_body(view, options))?;
                view.with_layout_content(Some(content), |view| {
                    engine.render_layout(view, &layout, &options.locals)
                })
            }
        })
    }
}

/// The layout a call renders inside, if any.
///
/// Without an explicit choice only the outermost action, template or file
/// render uses the handler's layout.
fn resolve_layout(session: &RenderSession, options: &RenderOptions) -> Option<String> {
    match &options.layout {
        LayoutChoice::None => None,
        LayoutChoice::Named(name) => Some(name.clone()),
        LayoutChoice::Default => {
            let wants_layout = matches!(
                options.target,
                RenderTarget::Action(_) | RenderTarget::Template(_) | RenderTarget::File(_)
            );
            if wants_layout && session.depth() == 1 {
                session.handler().layout_name().map(str::to_string)
            } else {
                None
            }
        }
    }
}

fn content_proc(options: &RenderOptions) -> ContentProc {
    let options = options.clone();
    Arc::new(
        move |view: &mut ViewContext<'_>, request: ContentRequest<'_>| -> RenderResult<()> {
            match request {
                ContentRequest::Main => {
                    view.flush()?;
                    let engine = view.renderer().engine();
                    view.with_content_proc(None, |view| engine.render_body(view, &options))?;
                    view.flush()
                }
                ContentRequest::Named(_) => {
                    view.write_stored(request);
                    Ok(())
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerConfig;
    use crate::snapshot::{FlashAccess, MemoryFlash, SessionTokens, TokenAccess};

    fn session(depth: usize) -> RenderSession {
        let handler = HandlerConfig::new("posts").layout("application", true);
        let mut session = RenderSession::new(
            Arc::new(handler),
            "index",
            FlashAccess::new(Arc::new(MemoryFlash::default())),
            TokenAccess::new(Arc::new(SessionTokens::new())),
        );
        for _ in 0..depth {
            session.enter();
        }
        session
    }

    #[test]
    fn top_level_actions_use_handler_layout() {
        let options = RenderOptions::action("index");
        assert_eq!(resolve_layout(&session(1), &options), Some("application".into()));
        assert_eq!(resolve_layout(&session(2), &options), None);
    }

    #[test]
    fn partials_have_no_default_layout() {
        assert_eq!(resolve_layout(&session(1), &RenderOptions::partial("row")), None);
        assert_eq!(
            resolve_layout(&session(2), &RenderOptions::partial("row").with_layout("card")),
            Some("card".into())
        );
    }

    #[test]
    fn explicit_no_layout_wins() {
        let options = RenderOptions::template("posts/index").without_layout();
        assert_eq!(resolve_layout(&session(1), &options), None);
        assert_eq!(resolve_layout(&session(1), &RenderOptions::text("hi")), None);
    }
}
