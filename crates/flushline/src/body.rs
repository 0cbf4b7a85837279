//! Streaming body primitives.
//!
//! A [`StreamingBody`] wraps a deferred render (the producer). The
//! transport binds a [`ChunkSink`] and calls [`StreamingBody::consume`];
//! the producer then runs exactly once and hands chunks to the sink through
//! [`BodyWriter::push`] as soon as they exist.
//!
//! # Padding
//!
//! Some browsers hold back incremental rendering until a minimum number of
//! bytes has arrived. The first push is padded with inert filler up to the
//! body's threshold, so the first chunk is exactly `max(threshold, len)`
//! bytes. Later pushes are forwarded unchanged.

use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::{debug, error};

use crate::error::StreamError;

/// Destination for pushed chunks, bound when consumption begins.
///
/// `send` runs to completion before `push` returns, so any backpressure
/// in the transport is felt directly by the producer.
pub trait ChunkSink {
    fn send(&mut self, chunk: Bytes) -> Result<(), StreamError>;
}

impl ChunkSink for Vec<Bytes> {
    fn send(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        self.push(chunk);
        Ok(())
    }
}

type Producer = Box<dyn FnOnce(&mut BodyWriter<'_>) -> Result<(), StreamError> + Send>;

/// A push-based, single-pass response body.
pub struct StreamingBody {
    bytes_to_threshold: usize,
    producer: Option<Producer>,
}

impl StreamingBody {
    pub fn new<F>(threshold: usize, producer: F) -> Self
    where
        F: FnOnce(&mut BodyWriter<'_>) -> Result<(), StreamError> + Send + 'static,
    {
        Self {
            bytes_to_threshold: threshold,
            producer: Some(Box::new(producer)),
        }
    }

    /// Remaining bytes the first push must reach.
    pub fn threshold(&self) -> usize {
        self.bytes_to_threshold
    }

    /// Returns `true` once the producer has been taken.
    pub fn is_consumed(&self) -> bool {
        self.producer.is_none()
    }

    /// Bind `sink` and run the producer to completion or error.
    ///
    /// Errors raised by the producer propagate unchanged; chunks pushed
    /// before the failure have already reached the sink.
    pub fn consume(&mut self, sink: &mut dyn ChunkSink) -> Result<(), StreamError> {
        let Some(producer) = self.producer.take() else {
            error!("attempted to consume a streaming body twice");
            return Err(StreamError::AlreadyConsumed);
        };

        let mut writer = BodyWriter {
            bytes_to_threshold: &mut self.bytes_to_threshold,
            sink,
            chunks: 0,
        };
        let result = producer(&mut writer);
        let chunks = writer.chunks;

        match &result {
            Ok(()) => debug!(chunks, "streaming body complete"),
            Err(e) => error!(chunks, error = %e, "streaming body failed"),
        }
        result
    }
}

impl fmt::Debug for StreamingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingBody")
            .field("bytes_to_threshold", &self.bytes_to_threshold)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Handle given to the producer for the duration of one consumption.
pub struct BodyWriter<'a> {
    bytes_to_threshold: &'a mut usize,
    sink: &'a mut dyn ChunkSink,
    chunks: usize,
}

impl BodyWriter<'_> {
    /// Forward `data` to the sink, padding it if this is the first push.
    pub fn push(&mut self, data: impl Into<Bytes>) -> Result<(), StreamError> {
        let data = data.into();
        let threshold = std::mem::take(self.bytes_to_threshold);

        let chunk = if threshold > 0 && data.len() < threshold {
            let pad = threshold - data.len();
            let mut padded = BytesMut::with_capacity(threshold);
            padded.extend_from_slice(&data);
            padded.extend_from_slice(&filler(pad));
            debug!(len = data.len(), pad, "pushing padded first chunk");
            padded.freeze()
        } else {
            debug!(len = data.len(), "pushing chunk");
            data
        };

        self.chunks += 1;
        self.sink.send(chunk)
    }

    /// Number of chunks pushed so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &[u8] = b"-->";

/// Exactly `len` bytes a browser will not render.
///
/// Long enough gaps become an HTML comment; anything shorter than an
/// empty comment is plain spaces.
pub fn filler(len: usize) -> Vec<u8> {
    let overhead = COMMENT_OPEN.len() + COMMENT_CLOSE.len();
    if len < overhead {
        return vec![b' '; len];
    }
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(COMMENT_OPEN);
    out.resize(len - COMMENT_CLOSE.len(), b' ');
    out.extend_from_slice(COMMENT_CLOSE);
    out
}
