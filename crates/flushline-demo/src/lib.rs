//! flushline-demo — a small site served with progressive rendering.
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `/` | Post feed, streamed (layout head flushed before the feed) |
//! | `/plain` | The same page, fully buffered |
//! | `/api/status` | Renderer configuration and stream count as JSON |
//!
//! `?notice=...` on either page sets a flash message for that request.

pub mod pages;
pub mod views;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use flushline::{
    HandlerConfig, ProgressiveConfig, ProgressiveRenderer, RenderResult, TemplateRegistry,
    TemplateRenderer,
};
use tracing::info;

/// Shared state for demo handlers.
#[derive(Clone)]
pub struct AppState {
    pub renderer: ProgressiveRenderer,
    pub home: Arc<HandlerConfig>,
    pub plain: Arc<HandlerConfig>,
    pub streams: Arc<AtomicUsize>,
}

impl AppState {
    /// Register templates and build the renderer. `delay` slows the feed
    /// down so the early flush is visible in a browser.
    pub fn new(config: ProgressiveConfig, delay: Duration) -> RenderResult<Self> {
        let mut templates = TemplateRegistry::new();
        pages::register(&mut templates, delay)?;

        let streams = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&streams);
        let renderer = ProgressiveRenderer::builder(TemplateRenderer::new(templates))
            .config(config)
            .on_stream_start(move |start| {
                let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                info!(handler = start.handler, threshold = start.threshold, streams = n, "page streaming");
            })
            .build();

        let home = Arc::new(HandlerConfig::new("home").layout("application", true));
        let plain = Arc::new(HandlerConfig::inherit(&home, "plain").progressive(false));

        Ok(Self {
            renderer,
            home,
            plain,
            streams,
        })
    }
}

/// Build the demo router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/plain", get(pages::plain))
        .route("/api/status", get(pages::status))
        .with_state(state)
}
