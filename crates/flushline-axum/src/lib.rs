//! axum transport for flushline responses.
//!
//! Buffered bodies become ordinary axum bodies. A streaming body's producer
//! runs on tokio's blocking pool and hands each chunk to a bounded channel;
//! the receiving end is the response body. When the channel is full the
//! producer blocks, so a slow client slows the render instead of growing a
//! buffer.
//!
//! A producer failure after the head was sent is delivered as the final
//! item of the body stream, which makes hyper abort the connection rather
//! than end the response cleanly.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use flushline::{ChunkSink, Response, ResponseBody, StandardHeaders, StreamError, StreamingBody};
use futures_core::Stream;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Chunk sink backed by a bounded tokio channel.
///
/// Must be driven from a blocking context (see [`spawn_body`]).
pub struct ChannelSink {
    tx: mpsc::Sender<Result<Bytes, StreamError>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Result<Bytes, StreamError>>) -> Self {
        Self { tx }
    }

    fn fail(&self, err: StreamError) {
        // The receiver may be gone already; nothing left to tell.
        let _ = self.tx.blocking_send(Err(err));
    }
}

impl ChunkSink for ChannelSink {
    fn send(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        self.tx.blocking_send(Ok(chunk)).map_err(|_| {
            warn!("client disconnected mid-stream");
            StreamError::Disconnected
        })
    }
}

/// Receiving half of a streamed body.
pub struct BodyStream {
    rx: mpsc::Receiver<Result<Bytes, StreamError>>,
}

impl Stream for BodyStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Start consuming `body` on the blocking pool and return its chunks as a
/// stream. At most `capacity` chunks are queued ahead of the client.
pub fn spawn_body(mut body: StreamingBody, capacity: usize) -> BodyStream {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink::new(tx);
        match body.consume(&mut sink) {
            Ok(()) => {}
            Err(StreamError::Disconnected) => debug!("stream abandoned by client"),
            Err(err) => sink.fail(err),
        }
    });
    BodyStream { rx }
}

/// Convert a rendered response into an axum response.
///
/// Headers are finalized first if the render did not already do so.
pub fn into_axum_response(
    mut response: Response,
    capacity: usize,
) -> Result<axum::response::Response, axum::http::Error> {
    response.prepare(&StandardHeaders);
    let (status, headers, body) = response.into_parts();

    let mut builder = axum::http::Response::builder().status(status);
    for header in headers.iter() {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }

    let body = match body {
        ResponseBody::Empty => Body::empty(),
        ResponseBody::Buffered(text) => Body::from(text),
        ResponseBody::Streaming(body) => {
            debug!(threshold = body.threshold(), capacity, "handing streaming body to axum");
            Body::from_stream(spawn_body(body, capacity))
        }
    };
    builder.body(body)
}

/// A rendered response returned straight from an axum handler.
pub struct Rendered {
    response: Response,
    capacity: usize,
}

impl Rendered {
    pub fn new(response: Response, capacity: usize) -> Self {
        Self { response, capacity }
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> axum::response::Response {
        match into_axum_response(self.response, self.capacity) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "invalid response head");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_reports_disconnect_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        let err = sink.send(Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, StreamError::Disconnected));
    }

    #[test]
    fn sink_forwards_chunks_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        sink.send(Bytes::from_static(b"a")).unwrap();
        sink.send(Bytes::from_static(b"b")).unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), Bytes::from_static(b"a"));
        assert_eq!(rx.try_recv().unwrap().unwrap(), Bytes::from_static(b"b"));
    }

    #[test]
    fn unprepared_buffered_response_gets_standard_headers() {
        let mut response = Response::new();
        response.set_body("hello");
        let converted = into_axum_response(response, 4).unwrap();
        assert_eq!(converted.status(), StatusCode::OK);
        assert_eq!(converted.headers()["content-length"], "5");
        assert_eq!(converted.headers()["content-type"], "text/html; charset=utf-8");
    }
}
