//! Record framing for the incremental transport.
//!
//! The transport delivers arbitrary byte chunks; records are newline-
//! delimited, either bare NDJSON objects or SSE `data: <json>` lines. The
//! buffer is byte-level so a record (or a multi-byte UTF-8 sequence) split
//! across two chunks is never mis-parsed; it is deferred until its
//! delimiter arrives.

/// One complete frame extracted from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The JSON payload of one record.
    Record(String),
    /// The SSE `[DONE]` sentinel.
    EndOfStream,
}

/// Accumulates transport chunks and yields complete frames.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buf: Vec<u8>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete record it finishes.
    /// The trailing partial fragment, if any, is retained for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..newline]);
            let line = line.trim();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let payload = line.strip_prefix("data: ").unwrap_or(line);
            if payload == "[DONE]" {
                frames.push(Frame::EndOfStream);
            } else {
                frames.push(Frame::Record(payload.to_string()));
            }
        }
        frames
    }

    /// Whether an undelimited fragment is still pending.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }
}
