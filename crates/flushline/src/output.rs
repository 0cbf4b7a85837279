//! Destinations for view output.

use crate::body::BodyWriter;
use crate::error::RenderResult;

/// Where a view writes its markup.
pub trait Output {
    fn append(&mut self, s: &str);

    /// Hand everything appended so far to the client, if this output streams.
    fn flush(&mut self) -> RenderResult<()>;
}

/// Non-streaming output: everything stays in the string.
impl Output for String {
    fn append(&mut self, s: &str) {
        self.push_str(s);
    }

    fn flush(&mut self) -> RenderResult<()> {
        Ok(())
    }
}

/// Buffers view output and pushes it to a streaming body on flush.
pub struct StreamOutput<'w, 'b> {
    pending: String,
    writer: &'w mut BodyWriter<'b>,
}

impl<'w, 'b> StreamOutput<'w, 'b> {
    pub fn new(writer: &'w mut BodyWriter<'b>) -> Self {
        Self {
            pending: String::new(),
            writer,
        }
    }
}

impl Output for StreamOutput<'_, '_> {
    fn append(&mut self, s: &str) {
        self.pending.push_str(s);
    }

    fn flush(&mut self) -> RenderResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.pending);
        self.writer.push(chunk)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::body::StreamingBody;

    #[test]
    fn string_output_ignores_flush() {
        let mut out = String::new();
        out.append("a");
        Output::flush(&mut out).unwrap();
        out.append("b");
        assert_eq!(out, "ab");
    }

    #[test]
    fn stream_output_pushes_on_flush_only() {
        let mut body = StreamingBody::new(0, |writer| {
            let mut out = StreamOutput::new(writer);
            out.append("<head>");
            out.append("</head>");
            out.flush()?;
            out.flush()?;
            out.append("<body>");
            out.flush()?;
            Ok(())
        });
        let mut sink = Vec::new();
        body.consume(&mut sink).unwrap();
        assert_eq!(sink, vec![Bytes::from("<head></head>"), Bytes::from("<body>")]);
    }
}
