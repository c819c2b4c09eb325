//! Shared test helpers: scripted transport and recording sink.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use weft::error::{Result, WeftError};
use weft::session::PresentationSink;
use weft::transport::{ChatRequest, StreamTransport};
use weft::types::RenderedDocument;

/// How a scripted stream ends after its chunks are exhausted.
#[derive(Clone, Copy)]
pub enum Ending {
    /// Clean end of body.
    Eof,
    /// A mid-stream read error.
    ReadError,
    /// Never ends; the stream stays pending (for cancellation tests).
    Hang,
}

/// Transport that replays scripted chunks without any network.
pub struct ScriptedTransport {
    chunks: Vec<Vec<u8>>,
    ending: Ending,
}

impl ScriptedTransport {
    pub fn new(chunks: Vec<Vec<u8>>, ending: Ending) -> Self {
        Self { chunks, ending }
    }

    /// One `data:` line per record, delivered as a single chunk.
    pub fn sse(records: &[&str], ending: Ending) -> Self {
        let mut body = String::new();
        for record in records {
            body.push_str("data: ");
            body.push_str(record);
            body.push('\n');
        }
        Self::new(vec![body.into_bytes()], ending)
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, _request: &ChatRequest) -> Result<BoxStream<'static, Result<Bytes>>> {
        let chunks = self.chunks.clone();
        let ending = self.ending;
        let stream = async_stream::stream! {
            for chunk in chunks {
                yield Ok(Bytes::from(chunk));
            }
            match ending {
                Ending::Eof => {}
                Ending::ReadError => yield Err(WeftError::Stream("connection reset".into())),
                Ending::Hang => futures::future::pending::<()>().await,
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Everything a recording sink observed, in call order.
#[derive(Debug, Default, Clone)]
pub struct SinkEvents {
    pub thinking: Vec<bool>,
    pub executing: Vec<bool>,
    pub renders: Vec<RenderedDocument>,
    pub failures: Vec<String>,
}

/// Shared handle to a recording sink's log.
#[derive(Default, Clone)]
pub struct SinkLog {
    inner: Arc<Mutex<SinkEvents>>,
}

impl SinkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Box<dyn PresentationSink> {
        Box::new(RecordingSink(self.clone()))
    }

    pub fn events(&self) -> SinkEvents {
        self.inner.lock().unwrap().clone()
    }

    /// Final state of an indicator, defaulting to off if never toggled.
    pub fn thinking_final(&self) -> bool {
        self.events().thinking.last().copied().unwrap_or(false)
    }

    pub fn executing_final(&self) -> bool {
        self.events().executing.last().copied().unwrap_or(false)
    }

    pub fn render_count(&self) -> usize {
        self.events().renders.len()
    }
}

struct RecordingSink(SinkLog);

impl PresentationSink for RecordingSink {
    fn thinking(&mut self, on: bool) {
        self.0.inner.lock().unwrap().thinking.push(on);
    }

    fn executing(&mut self, on: bool) {
        self.0.inner.lock().unwrap().executing.push(on);
    }

    fn content_appended(&mut self, document: &RenderedDocument) {
        self.0.inner.lock().unwrap().renders.push(document.clone());
    }

    fn stream_failed(&mut self, message: &str) {
        self.0.inner.lock().unwrap().failures.push(message.into());
    }
}
