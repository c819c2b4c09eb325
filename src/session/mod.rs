//! Chat sessions: one streaming exchange, from request to rendered document.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::assembler::{Phase, StreamAssembler};
use crate::error::{Result, WeftError};
use crate::render::RenderPipeline;
use crate::transport::{ChatRequest, StreamTransport};
use crate::types::{DocumentPart, RenderedDocument};
use crate::util::RetryPolicy;

/// The presentation surface a session drives: an append-only container for
/// rendered fragments plus the transient indicator region.
///
/// Implementations may coalesce `content_appended` calls (animation-frame
/// batching and the like); the final call after the stream completes always
/// carries the full document exactly once. Scroll behavior belongs to the
/// implementor — see [`ScrollState`].
pub trait PresentationSink: Send {
    /// Toggle the "thinking" indicator shown before the first event.
    fn thinking(&mut self, on: bool);
    /// Toggle the "executing" indicator shown during a code-execution phase.
    fn executing(&mut self, on: bool);
    /// A re-render of the document is available.
    fn content_appended(&mut self, document: &RenderedDocument);
    /// The stream failed; `message` is the categorized user-facing text.
    fn stream_failed(&mut self, message: &str);
}

/// Sink that ignores every signal.
pub struct NullSink;

impl PresentationSink for NullSink {
    fn thinking(&mut self, _on: bool) {}
    fn executing(&mut self, _on: bool) {}
    fn content_appended(&mut self, _document: &RenderedDocument) {}
    fn stream_failed(&mut self, _message: &str) {}
}

/// Explicit "is the user near the bottom" state for auto-scroll decisions.
///
/// The presentation layer updates this from its own scroll metrics and
/// consults [`ScrollState::should_follow`] on each `content_appended`
/// notification, instead of inferring intent from DOM geometry after the
/// fact. A new outgoing message re-pins to the bottom.
#[derive(Debug, Clone)]
pub struct ScrollState {
    near_bottom: bool,
    threshold: f64,
}

impl ScrollState {
    pub fn new(threshold: f64) -> Self {
        Self {
            near_bottom: true,
            threshold,
        }
    }

    /// Update from current scroll metrics.
    pub fn update(&mut self, scroll_height: f64, scroll_top: f64, client_height: f64) {
        self.near_bottom = scroll_height - scroll_top - client_height < self.threshold;
    }

    /// Force-follow, e.g. when the user sends a new message.
    pub fn pin(&mut self) {
        self.near_bottom = true;
    }

    /// Whether appended content should scroll into view.
    pub fn should_follow(&self) -> bool {
        self.near_bottom
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(100.0)
    }
}

enum Outcome {
    Completed,
    Failed(WeftError),
    Cancelled,
}

/// One streaming chat exchange.
///
/// Owns its assembler and transport exclusively; concurrent sessions are
/// fully independent. The read loop is cooperative: each chunk is fully
/// applied before the next is accepted.
pub struct ChatSession {
    id: Uuid,
    assembler: StreamAssembler,
    transport: Box<dyn StreamTransport>,
    cancel: CancellationToken,
    retry: RetryPolicy,
}

impl ChatSession {
    pub fn new(
        transport: Box<dyn StreamTransport>,
        pipeline: RenderPipeline,
        sink: Box<dyn PresentationSink>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            assembler: StreamAssembler::new(pipeline, sink),
            transport,
            cancel: CancellationToken::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy applied when opening the request.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Token for tearing the session down mid-stream. Cancellation stops
    /// transport consumption, processes no further events, and surfaces
    /// nothing to the presentation layer.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Send the request and consume the stream to completion.
    ///
    /// Indicator cleanup runs on every exit path: completion, transport
    /// failure, and teardown.
    pub async fn run(&mut self, request: ChatRequest) -> Result<RenderedDocument> {
        debug!(session = %self.id, "chat session starting");
        self.assembler.begin();

        let opened = {
            let transport = &self.transport;
            let request = &request;
            self.retry.execute(|| transport.open(request)).await
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                self.assembler.fail(&err);
                self.assembler.shutdown_indicators();
                return Err(err);
            }
        };

        let cancel = self.cancel.clone();
        let outcome = loop {
            tokio::select! {
                _ = cancel.cancelled() => break Outcome::Cancelled,
                next = stream.next() => match next {
                    Some(Ok(chunk)) => {
                        if let Err(err) = self.assembler.feed(&chunk) {
                            break Outcome::Failed(err);
                        }
                        if self.assembler.phase() == Phase::Done {
                            break Outcome::Completed;
                        }
                    }
                    Some(Err(err)) => break Outcome::Failed(err),
                    None => break Outcome::Completed,
                },
            }
        };
        drop(stream);

        let result = match outcome {
            Outcome::Completed => {
                self.assembler.finish();
                Ok(self.assembler.render())
            }
            Outcome::Failed(err) => {
                self.assembler.fail(&err);
                Err(err)
            }
            Outcome::Cancelled => {
                debug!(session = %self.id, "session torn down mid-stream");
                Ok(self.assembler.render())
            }
        };
        self.assembler.shutdown_indicators();
        result
    }

    pub fn phase(&self) -> Phase {
        self.assembler.phase()
    }

    /// The finalized parts, for appending an assistant turn to the history.
    pub fn into_parts(self) -> Vec<DocumentPart> {
        self.assembler.into_parts()
    }
}
