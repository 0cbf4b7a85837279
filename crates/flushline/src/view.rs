//! The context templates render against.
//!
//! A [`ViewContext`] pairs the request's [`RenderSession`] with the current
//! [`Output`]. Nested renders (partials, `render_to_string`) go back through
//! the [`ProgressiveRenderer`], so they are counted in the session's depth
//! and always render synchronously.

use std::mem;

use tracing::debug;

use crate::error::RenderResult;
use crate::guard::Restore;
use crate::options::{Locals, RenderArgs, RenderOptions};
use crate::output::Output;
use crate::policy::ProgressiveRenderer;
use crate::session::{ContentProc, ContentRequest, RenderSession};
use crate::snapshot::Flash;

/// A template the renderer can evaluate.
pub trait Template: Send + Sync {
    fn render(&self, view: &mut ViewContext<'_>, locals: &Locals) -> RenderResult<()>;
}

impl<F> Template for F
where
    F: Fn(&mut ViewContext<'_>, &Locals) -> RenderResult<()> + Send + Sync,
{
    fn render(&self, view: &mut ViewContext<'_>, locals: &Locals) -> RenderResult<()> {
        self(view, locals)
    }
}

pub struct ViewContext<'a> {
    renderer: &'a ProgressiveRenderer,
    session: &'a mut RenderSession,
    out: &'a mut dyn Output,
}

impl<'a> ViewContext<'a> {
    pub(crate) fn new(
        renderer: &'a ProgressiveRenderer,
        session: &'a mut RenderSession,
        out: &'a mut dyn Output,
    ) -> Self {
        Self {
            renderer,
            session,
            out,
        }
    }

    pub fn renderer(&self) -> &'a ProgressiveRenderer {
        self.renderer
    }

    pub fn session(&self) -> &RenderSession {
        self.session
    }

    pub fn write(&mut self, s: &str) {
        self.out.append(s);
    }

    /// Push pending output to the client when streaming.
    pub fn flush(&mut self) -> RenderResult<()> {
        self.out.flush()
    }

    /// Emit the layout's inner content.
    pub fn yield_content(&mut self) -> RenderResult<()> {
        self.invoke_content(ContentRequest::Main)
    }

    /// Emit a named region collected with [`content_for`](Self::content_for).
    pub fn yield_named(&mut self, name: &str) -> RenderResult<()> {
        self.invoke_content(ContentRequest::Named(name))
    }

    /// Append `content` to the named region.
    pub fn content_for(&mut self, name: &str, content: &str) {
        self.session.append_content(name, content);
    }

    /// Write the stored content for `request` without invoking any callback.
    pub(crate) fn write_stored(&mut self, request: ContentRequest<'_>) {
        let content = match request {
            ContentRequest::Main => self.session.layout_content.clone(),
            ContentRequest::Named(name) => self.session.content_for(name).map(str::to_string),
        };
        if let Some(content) = content {
            self.out.append(&content);
        }
    }

    fn invoke_content(&mut self, request: ContentRequest<'_>) -> RenderResult<()> {
        match self.session.content_proc.clone() {
            Some(proc) => proc(self, request),
            None => {
                self.write_stored(request);
                Ok(())
            }
        }
    }

    /// Render nested content into the current output.
    pub fn render(&mut self, args: impl Into<RenderArgs>) -> RenderResult<()> {
        let args = args.into();
        let depth = self.session.enter();
        let options = args.into_options(self.session.action());
        debug!(depth, target = ?options.target, "nested render");
        let renderer = self.renderer;
        let mut view = Restore::new(self, |view: &mut Self| view.session.leave());
        renderer.render_nested(&mut *view, &options)
    }

    pub fn render_partial(&mut self, name: &str, locals: Locals) -> RenderResult<()> {
        let mut options = RenderOptions::partial(name);
        options.locals = locals;
        self.render(options)
    }

    /// Render nested content and return it instead of emitting it.
    pub fn render_to_string(&mut self, args: impl Into<RenderArgs>) -> RenderResult<String> {
        let mut buf = String::new();
        self.with_output(&mut buf, |view| view.render(args))?;
        Ok(buf)
    }

    /// Flash contents, from the streaming snapshot when one was taken.
    pub fn flash(&self) -> Flash {
        self.session.flash().read()
    }

    pub fn csrf_token(&self) -> RenderResult<String> {
        self.session.token().read()
    }

    /// Run `f` against a different output.
    pub(crate) fn with_output<T>(
        &mut self,
        out: &mut dyn Output,
        f: impl FnOnce(&mut ViewContext<'_>) -> T,
    ) -> T {
        let mut view = ViewContext {
            renderer: self.renderer,
            session: &mut *self.session,
            out,
        };
        f(&mut view)
    }

    /// Run `f` with `proc` as the active content callback. The previous
    /// callback is back in place once this returns or unwinds.
    pub(crate) fn with_content_proc<T>(
        &mut self,
        proc: Option<ContentProc>,
        f: impl FnOnce(&mut Self) -> RenderResult<T>,
    ) -> RenderResult<T> {
        let saved = mem::replace(&mut self.session.content_proc, proc);
        let mut view = Restore::new(self, move |view: &mut Self| view.session.content_proc = saved);
        f(&mut *view)
    }

    /// Run `f` with `content` in the layout slot, restoring the previous
    /// content afterwards.
    pub(crate) fn with_layout_content<T>(
        &mut self,
        content: Option<String>,
        f: impl FnOnce(&mut Self) -> RenderResult<T>,
    ) -> RenderResult<T> {
        let saved = mem::replace(&mut self.session.layout_content, content);
        let mut view = Restore::new(self, move |view: &mut Self| view.session.layout_content = saved);
        f(&mut *view)
    }
}
