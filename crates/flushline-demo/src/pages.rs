//! Demo page handlers.
//!
//! Rendering is synchronous, so each handler moves it onto the blocking
//! pool. A streamed page returns as soon as the body is installed; the
//! feed itself is produced while the client is already reading the head.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use askama::Template;
use axum::extract::{Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use flushline::{
    HandlerConfig, Locals, MemoryFlash, RenderArgs, RenderOptions, RenderResult, RequestScope,
    TemplateRegistry, ViewContext,
};
use flushline_axum::Rendered;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::views::{self, PostView};

const LAYOUT: &str = include_str!("../templates/layouts/application.html");

#[derive(Template)]
#[template(path = "feed.html")]
struct FeedTemplate {
    posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "_sidebar.html")]
struct SidebarTemplate {
    tags: Vec<String>,
}

/// Register the layout and page templates. `delay` is added before the
/// feed is built to make the early flush visible.
pub fn register(templates: &mut TemplateRegistry, delay: Duration) -> RenderResult<()> {
    templates.insert_text("layouts/application", LAYOUT)?;
    templates.insert("home/index", feed(delay));
    templates.insert("plain/index", feed(delay));
    Ok(())
}

fn feed(delay: Duration) -> impl Fn(&mut ViewContext<'_>, &Locals) -> RenderResult<()> + Send + Sync {
    move |view: &mut ViewContext<'_>, _: &Locals| -> RenderResult<()> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let sidebar = views::render("_sidebar", &SidebarTemplate { tags: views::tags() })?;
        view.content_for("sidebar", &sidebar);

        let html = views::render("feed", &FeedTemplate { posts: views::recent_posts() })?;
        view.write(&html);
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    notice: Option<String>,
}

// ── Handlers ────────────────────────────────────────────────────

pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FlashParams>,
) -> Response {
    let handler = Arc::clone(&state.home);
    serve(state, handler, &headers, params, RenderArgs::Default).await
}

pub async fn plain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FlashParams>,
) -> Response {
    let handler = Arc::clone(&state.plain);
    serve(state, handler, &headers, params, RenderArgs::Default).await
}

/// Renderer status as JSON. Goes through the progressive handler to show
/// that non-template renders are never streamed.
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = state.renderer.config();
    let body = json!({
        "streams_started": state.streams.load(Ordering::Relaxed),
        "channel_capacity": config.channel_capacity,
        "snapshot_flash": config.snapshot_flash,
        "snapshot_token": config.snapshot_token,
        "padding": config.padding,
    });
    let handler = Arc::clone(&state.home);
    let args = RenderOptions::json(body).into();
    serve(state, handler, &headers, FlashParams::default(), args).await
}

async fn serve(
    state: AppState,
    handler: Arc<HandlerConfig>,
    headers: &HeaderMap,
    params: FlashParams,
    args: RenderArgs,
) -> Response {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let capacity = state.renderer.config().channel_capacity;
    let rendered = tokio::task::spawn_blocking(move || {
        let mut scope = RequestScope::new(handler, "index");
        if let Some(agent) = user_agent {
            scope = scope.with_user_agent(agent);
        }
        if let Some(notice) = params.notice {
            scope = scope.with_flash(Arc::new(MemoryFlash::with("notice", notice)));
        }
        state.renderer.render(&mut scope, args)?;
        Ok::<_, flushline::RenderError>(scope.into_response())
    })
    .await;

    match rendered {
        Ok(Ok(response)) => Rendered::new(response, capacity).into_response(),
        Ok(Err(err)) => {
            error!(error = %err, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
        Err(err) => {
            error!(error = %err, "render task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
