//! Render-stream policy.
//!
//! [`ProgressiveRenderer`] wraps a [`Renderer`] and is the only way a
//! request renders. Each call enters the session's depth counter; only a
//! top-level [`render`](ProgressiveRenderer::render) (depth 1) under a
//! progressive handler, for a template target, installs a
//! [`StreamingBody`]. Everything else renders synchronously into a string.
//!
//! When streaming applies, setup happens before any view code runs:
//!
//! 1. flash and CSRF token are snapshotted (per [`ProgressiveConfig`]),
//! 2. the streaming body replaces the response body and headers are
//!    finalized,
//! 3. stream-start hooks run in registration order.
//!
//! The body's producer then performs the render with the layout inverted,
//! so the layout shell reaches the client before the inner content exists.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::body::StreamingBody;
use crate::config::ProgressiveConfig;
use crate::error::{RenderError, RenderResult, StreamError};
use crate::guard::Restore;
use crate::options::{RenderArgs, RenderOptions};
use crate::output::{Output, StreamOutput};
use crate::renderer::Renderer;
use crate::request::RequestScope;
use crate::response::{ResponseFinalizer, StandardHeaders};
use crate::threshold::threshold_for;
use crate::view::ViewContext;

/// Details passed to stream-start hooks.
#[derive(Debug, Clone, Copy)]
pub struct StreamStart<'a> {
    pub handler: &'a str,
    pub action: &'a str,
    pub content_type: &'a str,
    pub threshold: usize,
}

pub type StreamHook = Box<dyn Fn(&StreamStart<'_>) + Send + Sync>;

struct Inner {
    engine: Arc<dyn Renderer>,
    config: ProgressiveConfig,
    finalizer: Arc<dyn ResponseFinalizer>,
    hooks: Vec<StreamHook>,
}

/// The progressive decorator around a [`Renderer`]. Cheap to clone.
#[derive(Clone)]
pub struct ProgressiveRenderer {
    inner: Arc<Inner>,
}

pub struct ProgressiveRendererBuilder {
    engine: Arc<dyn Renderer>,
    config: ProgressiveConfig,
    finalizer: Arc<dyn ResponseFinalizer>,
    hooks: Vec<StreamHook>,
}

impl ProgressiveRendererBuilder {
    pub fn config(mut self, config: ProgressiveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn finalizer(mut self, finalizer: impl ResponseFinalizer + 'static) -> Self {
        self.finalizer = Arc::new(finalizer);
        self
    }

    /// Register a callback run right before a streaming body is handed
    /// to the transport.
    pub fn on_stream_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(&StreamStart<'_>) + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn build(self) -> ProgressiveRenderer {
        ProgressiveRenderer {
            inner: Arc::new(Inner {
                engine: self.engine,
                config: self.config,
                finalizer: self.finalizer,
                hooks: self.hooks,
            }),
        }
    }
}

impl ProgressiveRenderer {
    pub fn builder(engine: impl Renderer + 'static) -> ProgressiveRendererBuilder {
        ProgressiveRendererBuilder {
            engine: Arc::new(engine),
            config: ProgressiveConfig::default(),
            finalizer: Arc::new(StandardHeaders),
            hooks: Vec::new(),
        }
    }

    pub fn new(engine: impl Renderer + 'static, config: ProgressiveConfig) -> Self {
        Self::builder(engine).config(config).build()
    }

    pub fn config(&self) -> &ProgressiveConfig {
        &self.inner.config
    }

    pub(crate) fn engine(&self) -> &dyn Renderer {
        self.inner.engine.as_ref()
    }

    /// Render the response for this request, streaming when the policy
    /// allows it.
    pub fn render(&self, scope: &mut RequestScope, args: impl Into<RenderArgs>) -> RenderResult<()> {
        let args = args.into();
        if scope.response().is_performed() {
            return Err(RenderError::DoubleRender);
        }

        let depth = scope.session_mut().enter();
        let mut scope = Restore::new(scope, |scope: &mut RequestScope| scope.session_mut().leave());
        if self.should_stream(&*scope, depth, &args) {
            self.begin_stream(&mut *scope, args)
        } else {
            self.render_buffered_response(&mut *scope, args)
        }
    }

    /// Render to a string. Never streams, even as the outermost call.
    pub fn render_to_string(
        &self,
        scope: &mut RequestScope,
        args: impl Into<RenderArgs>,
    ) -> RenderResult<String> {
        let args = args.into();
        let depth = scope.session_mut().enter();
        let mut scope = Restore::new(scope, |scope: &mut RequestScope| scope.session_mut().leave());
        let options = args.into_options(scope.session().action());
        debug!(depth, target = ?options.target, "render to string");

        let mut out = String::new();
        {
            let mut view = ViewContext::new(self, scope.session_mut(), &mut out);
            self.render_nested(&mut view, &options)?;
        }
        Ok(out)
    }

    fn should_stream(&self, scope: &RequestScope, depth: usize, args: &RenderArgs) -> bool {
        let handler = scope.session().handler();
        let stream = if depth != 1 {
            false
        } else if !handler.renders_progressively() {
            debug!(handler = handler.name(), "handler not progressive");
            false
        } else if !args.may_stream() {
            debug!(handler = handler.name(), ?args, "render target excluded from streaming");
            false
        } else {
            true
        };
        debug!(depth, handler = handler.name(), stream, "render policy decided");
        stream
    }

    fn render_buffered_response(&self, scope: &mut RequestScope, args: RenderArgs) -> RenderResult<()> {
        let options = args.into_options(scope.session().action());
        let mut out = String::new();
        {
            let mut view = ViewContext::new(self, scope.session_mut(), &mut out);
            self.render_buffered(&mut view, &options)?;
        }

        apply_options(scope, &options);
        let response = scope.response_mut();
        response.set_body(out);
        response.prepare(self.inner.finalizer.as_ref());
        Ok(())
    }

    fn begin_stream(&self, scope: &mut RequestScope, args: RenderArgs) -> RenderResult<()> {
        let options = args.into_options(scope.session().action());
        apply_options(scope, &options);

        let content_type = scope.response().content_type().to_string();
        let threshold = threshold_for(&self.inner.config.padding, &content_type, scope.user_agent());

        let session = scope.session();
        if self.inner.config.snapshot_flash {
            session.flash().take_snapshot();
        }
        if self.inner.config.snapshot_token {
            session.token().take_snapshot()?;
        }

        let mut stream_session = session.detach();
        let renderer = self.clone();
        let body = StreamingBody::new(threshold, move |writer| {
            stream_session.enter();
            let mut out = StreamOutput::new(writer);
            let result = {
                let mut view = ViewContext::new(&renderer, &mut stream_session, &mut out);
                renderer.render_progressive(&mut view, &options)
            };
            stream_session.leave();
            result.and_then(|()| out.flush()).map_err(StreamError::from)
        });

        let response = scope.response_mut();
        response.set_streaming(body);
        response.prepare(self.inner.finalizer.as_ref());

        let session = scope.session();
        info!(
            handler = session.handler().name(),
            action = session.action(),
            threshold,
            "streaming response"
        );
        let start = StreamStart {
            handler: session.handler().name(),
            action: session.action(),
            content_type: &content_type,
            threshold,
        };
        for hook in &self.inner.hooks {
            hook(&start);
        }
        Ok(())
    }
}

fn apply_options(scope: &mut RequestScope, options: &RenderOptions) {
    let response = scope.response_mut();
    if let Some(content_type) = options
        .content_type
        .as_deref()
        .or_else(|| options.target.content_type())
    {
        response.set_content_type(content_type);
    }
    if let Some(status) = options.status {
        response.set_status(status);
    }
}

impl fmt::Debug for ProgressiveRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveRenderer")
            .field("config", &self.inner.config)
            .field("hooks", &self.inner.hooks.len())
            .finish_non_exhaustive()
    }
}
