use std::fmt;

use tracing::debug;

use crate::body::StreamingBody;
use crate::header::HeaderMap;

/// Content type used when a render does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// An outgoing response whose body is either buffered or streaming.
///
/// Header finalization ([`Response::prepare`]) runs at most once. A
/// streaming render forces it early, before any body bytes exist, and a
/// later call from the framework's normal path is then a no-op.
#[derive(Debug)]
pub struct Response {
    status: u16,
    content_type: String,
    headers: HeaderMap,
    body: ResponseBody,
    prepared: bool,
}

pub enum ResponseBody {
    Empty,
    Buffered(String),
    Streaming(StreamingBody),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Buffered(body) => f.debug_tuple("Buffered").field(&body.len()).finish(),
            Self::Streaming(body) => f.debug_tuple("Streaming").field(body).finish(),
        }
    }
}

/// Finalizes headers once a body is in place.
pub trait ResponseFinalizer: Send + Sync {
    fn finalize(&self, response: &mut Response);
}

/// Sets `Content-Type`, plus `Content-Length` for buffered bodies or
/// `Cache-Control: no-cache` for streamed ones. Streamed bodies also get
/// `Vary: User-Agent`, since their first-chunk padding depends on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardHeaders;

impl ResponseFinalizer for StandardHeaders {
    fn finalize(&self, response: &mut Response) {
        let content_type = response.content_type.clone();
        response.headers.set("Content-Type", content_type);
        match &response.body {
            ResponseBody::Empty => response.headers.set("Content-Length", "0"),
            ResponseBody::Buffered(body) => {
                let len = body.len().to_string();
                response.headers.set("Content-Length", len);
            }
            ResponseBody::Streaming(_) => {
                response.headers.set("Cache-Control", "no-cache");
                response.headers.append("Vary", "User-Agent");
            }
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
            prepared: false,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns `true` once a body (buffered or streaming) was set.
    pub fn is_performed(&self) -> bool {
        !matches!(self.body, ResponseBody::Empty)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = ResponseBody::Buffered(body.into());
    }

    pub fn set_streaming(&mut self, body: StreamingBody) {
        self.body = ResponseBody::Streaming(body);
    }

    /// Buffered body text, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Buffered(body) => Some(body),
            _ => None,
        }
    }

    /// Run `finalizer` unless headers were already finalized.
    pub fn prepare(&mut self, finalizer: &dyn ResponseFinalizer) {
        if self.prepared {
            debug!("response already prepared");
            return;
        }
        finalizer.finalize(self);
        self.prepared = true;
    }

    pub fn into_parts(self) -> (u16, HeaderMap, ResponseBody) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting(AtomicUsize);

    impl ResponseFinalizer for Counting {
        fn finalize(&self, _response: &mut Response) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn prepare_runs_once() {
        let finalizer = Counting(AtomicUsize::new(0));
        let mut resp = Response::new();
        resp.prepare(&finalizer);
        resp.prepare(&finalizer);
        assert!(resp.is_prepared());
        assert_eq!(finalizer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn standard_headers_for_buffered_body() {
        let mut resp = Response::new();
        resp.set_content_type("application/json");
        resp.set_body("{}");
        resp.prepare(&StandardHeaders);
        assert_eq!(resp.headers().get("content-type"), Some("application/json"));
        assert_eq!(resp.headers().get("content-length"), Some("2"));
    }

    #[test]
    fn standard_headers_for_streaming_body() {
        let mut resp = Response::new();
        resp.set_streaming(StreamingBody::new(0, |w| w.push("x")));
        resp.prepare(&StandardHeaders);
        assert!(resp.is_streaming());
        assert_eq!(resp.headers().get("content-type"), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(resp.headers().get("content-length"), None);
        assert_eq!(resp.headers().get("cache-control"), Some("no-cache"));
        assert_eq!(resp.headers().get("vary"), Some("User-Agent"));
    }

    #[test]
    fn streaming_vary_keeps_existing_values() {
        let mut resp = Response::new();
        resp.headers_mut().append("Vary", "Accept-Encoding");
        resp.set_streaming(StreamingBody::new(0, |w| w.push("x")));
        resp.prepare(&StandardHeaders);
        let vary: Vec<&str> = resp
            .headers()
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case("vary"))
            .map(|h| h.value.as_str())
            .collect();
        assert_eq!(vary, ["Accept-Encoding", "User-Agent"]);
    }

    #[test]
    fn performed_tracks_body() {
        let mut resp = Response::new();
        assert!(!resp.is_performed());
        resp.set_body("hello");
        assert!(resp.is_performed());
        assert_eq!(resp.text(), Some("hello"));
    }
}
