//! Serving progressive renders through an axum router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use bytes::Bytes;
use flushline::{
    HandlerConfig, Locals, ProgressiveRenderer, RenderArgs, RenderError, RenderOptions,
    RenderResult, RequestScope, TemplateRegistry, TemplateRenderer, ViewContext,
};
use flushline_axum::Rendered;
use futures_util::StreamExt;
use tower::ServiceExt;

const CHROME: &str = "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

fn renderer() -> ProgressiveRenderer {
    let mut templates = TemplateRegistry::new();
    templates
        .insert_text("layouts/application", "<html><head></head><body>{{ yield }}</body></html>")
        .unwrap();
    templates.insert_text("pages/index", "<h1>Welcome</h1>").unwrap();
    templates.insert("pages/broken", |view: &mut ViewContext<'_>, _: &Locals| -> RenderResult<()> {
        view.write("<p>partial");
        view.flush()?;
        Err(RenderError::MissingLocal("user".into()))
    });
    ProgressiveRenderer::builder(TemplateRenderer::new(templates)).build()
}

fn render(renderer: &ProgressiveRenderer, headers: &HeaderMap, args: RenderArgs) -> Rendered {
    let handler = Arc::new(HandlerConfig::new("pages").layout("application", true));
    let mut scope = RequestScope::new(handler, "index");
    if let Some(agent) = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()) {
        scope = scope.with_user_agent(agent);
    }
    renderer.render(&mut scope, args).unwrap();
    Rendered::new(scope.into_response(), 4)
}

fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(|State(r): State<ProgressiveRenderer>, headers: HeaderMap| async move {
                render(&r, &headers, RenderArgs::Default)
            }),
        )
        .route(
            "/broken",
            get(|State(r): State<ProgressiveRenderer>, headers: HeaderMap| async move {
                render(&r, &headers, RenderArgs::Action("broken".into()))
            }),
        )
        .route(
            "/status",
            get(|State(r): State<ProgressiveRenderer>, headers: HeaderMap| async move {
                render(&r, &headers, RenderOptions::json(serde_json::json!({"ok": true})).into())
            }),
        )
        .with_state(renderer())
}

fn get_request(uri: &str, agent: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(agent) = agent {
        builder = builder.header(USER_AGENT, agent);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn progressive_page_streams_in_order() {
    let resp = router().oneshot(get_request("/", Some(CHROME))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert_eq!(resp.headers()["vary"], "User-Agent");
    assert!(resp.headers().get("content-length").is_none());

    let chunks: Vec<Bytes> = resp
        .into_body()
        .into_data_stream()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 2048);
    assert!(chunks[0].starts_with(b"<html><head></head><body>"));
    assert_eq!(chunks[1], Bytes::from_static(b"<h1>Welcome</h1>"));
    assert_eq!(chunks[2], Bytes::from_static(b"</body></html>"));
}

#[tokio::test]
async fn unknown_agent_gets_unpadded_stream() {
    let resp = router().oneshot(get_request("/", None)).await.unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        body,
        Bytes::from_static(b"<html><head></head><body><h1>Welcome</h1></body></html>")
    );
}

#[tokio::test]
async fn json_is_served_buffered() {
    let resp = router().oneshot(get_request("/status", Some(CHROME))).await.unwrap();
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.headers()["content-length"], "11");
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, Bytes::from_static(br#"{"ok":true}"#));
}

#[tokio::test]
async fn producer_failure_ends_body_with_error() {
    let resp = router().oneshot(get_request("/broken", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut stream = resp.into_body().into_data_stream();
    let mut received = Vec::new();
    let mut failed = false;
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => received.extend_from_slice(&chunk),
            Err(_) => {
                failed = true;
                break;
            }
        }
    }
    assert!(failed);
    assert_eq!(received, b"<html><head></head><body><p>partial");
}
