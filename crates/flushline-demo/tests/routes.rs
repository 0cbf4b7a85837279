//! Demo router tests.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use flushline::ProgressiveConfig;
use flushline_demo::{AppState, build_router};
use tower::ServiceExt;

const SAFARI: &str = "Mozilla/5.0 (Macintosh) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

fn state() -> AppState {
    AppState::new(ProgressiveConfig::default(), Duration::ZERO).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn home_is_streamed_with_flash() {
    let router = build_router(state());
    let req = Request::builder()
        .uri("/?notice=Welcome%20back")
        .header("user-agent", SAFARI)
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");

    let html = body_text(resp).await;
    assert!(html.len() >= 1024);
    assert!(html.contains(r#"<p class="notice">Welcome back</p>"#));
    assert!(html.contains("Layouts, inside out"));
    assert!(html.find("<main>").unwrap() < html.find("<aside>").unwrap());
    assert!(html.contains("<li>streaming</li>"));
}

#[tokio::test]
async fn plain_is_buffered() {
    let router = build_router(state());
    let req = Request::builder().uri("/plain").body(Body::empty()).unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("cache-control").is_none());
    let length: usize = resp.headers()["content-length"].to_str().unwrap().parse().unwrap();

    let html = body_text(resp).await;
    assert_eq!(html.len(), length);
    assert!(html.contains("Flushing early"));
    assert!(html.contains(r#"<p class="notice"></p>"#));
}

#[tokio::test]
async fn status_counts_streams() {
    let state = state();
    let router = build_router(state.clone());

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    body_text(resp).await;

    let req = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["content-type"], "application/json");

    let status: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(status["streams_started"], 1);
    assert_eq!(status["channel_capacity"], 16);
    assert_eq!(status["padding"][1]["pattern"], "Chrome");
}
