//! The stream assembler: raw transport bytes in, ordered document out.
//!
//! One assembler instance serves one streaming session. It owns the framing
//! buffer, the document state, and the indicator signaling, and it is driven
//! cooperatively: each `feed` call runs to completion before the next chunk
//! is accepted.

pub mod framing;

use std::collections::HashSet;

use strum::Display;
use tracing::{debug, warn};

use crate::error::{Result, WeftError};
use crate::render::RenderPipeline;
use crate::session::PresentationSink;
use crate::types::{ContentEvent, DocumentPart, RenderedDocument};

use framing::{Frame, RecordBuffer};

/// Assembly lifecycle.
///
/// `Done` and `Errored` are terminal; feeding after either is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Idle,
    Streaming,
    CodeRunning,
    Done,
    Errored,
}

/// Assembles typed content events into an ordered `DocumentPart` sequence.
pub struct StreamAssembler {
    parts: Vec<DocumentPart>,
    open_text: String,
    seen_images: HashSet<String>,
    notices: Vec<String>,
    phase: Phase,
    buffer: RecordBuffer,
    pipeline: RenderPipeline,
    sink: Box<dyn PresentationSink>,
    received_content: bool,
    executing: bool,
}

impl StreamAssembler {
    pub fn new(pipeline: RenderPipeline, sink: Box<dyn PresentationSink>) -> Self {
        Self {
            parts: Vec::new(),
            open_text: String::new(),
            seen_images: HashSet::new(),
            notices: Vec::new(),
            phase: Phase::Idle,
            buffer: RecordBuffer::new(),
            pipeline,
            sink,
            received_content: false,
            executing: false,
        }
    }

    /// Signal that the session has started waiting for the first event.
    pub fn begin(&mut self) {
        self.sink.thinking(true);
    }

    /// Consume one transport chunk.
    ///
    /// Splits off every complete record, decodes and applies each one, and
    /// retains the trailing partial fragment. A record that fails to decode
    /// is logged and skipped; it neither aborts the stream nor corrupts the
    /// assembled parts.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        if matches!(self.phase, Phase::Done | Phase::Errored) {
            return Err(WeftError::InvalidState(format!(
                "feed after terminal phase {}",
                self.phase
            )));
        }
        if self.phase == Phase::Idle {
            self.phase = Phase::Streaming;
        }

        for frame in self.buffer.push(chunk) {
            if self.phase == Phase::Done {
                debug!("ignoring record after done");
                continue;
            }
            match frame {
                Frame::Record(json) => match ContentEvent::from_record(&json) {
                    Ok(event) => self.process_event(event),
                    Err(err) => warn!(%err, record = %json, "skipping malformed record"),
                },
                Frame::EndOfStream => self.process_event(ContentEvent::Done),
            }
        }
        Ok(())
    }

    /// Apply one decoded event to the document state.
    pub fn process_event(&mut self, event: ContentEvent) {
        match event {
            ContentEvent::Text(delta) => {
                self.mark_received();
                self.open_text.push_str(&delta);
                self.request_render();
            }
            ContentEvent::Code(source) => {
                self.mark_received();
                self.flush_open_text();
                self.parts.push(DocumentPart::Code(source));
                self.phase = Phase::CodeRunning;
                self.request_render();
                self.set_executing(true);
            }
            ContentEvent::Result(output) => {
                self.mark_received();
                self.set_executing(false);
                self.parts.push(DocumentPart::Result(output));
                self.phase = Phase::Streaming;
                self.request_render();
            }
            ContentEvent::Image(data) => {
                self.mark_received();
                self.set_executing(false);
                self.flush_open_text();
                if self.seen_images.contains(&data) {
                    debug!("discarding duplicate image payload");
                    return;
                }
                self.seen_images.insert(data.clone());
                self.parts.push(DocumentPart::Image(data));
                self.request_render();
            }
            ContentEvent::Error(message) => {
                self.mark_received();
                self.notices.push(message);
                self.request_render();
            }
            ContentEvent::Done => {
                self.flush_open_text();
                self.phase = Phase::Done;
                self.request_render();
            }
        }
    }

    /// Mark the stream complete if the transport ended without a `done`
    /// record. Flushes the open text run exactly once; idempotent.
    pub fn finish(&mut self) {
        if self.phase != Phase::Done {
            self.process_event(ContentEvent::Done);
        }
    }

    /// Record a fatal transport failure: terminal phase, categorized message
    /// surfaced to the presentation layer. The assembled parts survive.
    pub fn fail(&mut self, err: &WeftError) {
        self.mark_received();
        self.phase = Phase::Errored;
        self.sink.stream_failed(&err.user_message());
    }

    /// Remove every transient indicator. Runs on each exit path: normal
    /// completion, in-band error, transport failure, teardown.
    pub fn shutdown_indicators(&mut self) {
        self.sink.thinking(false);
        self.set_executing(false);
    }

    /// Deterministically render the current document state: finalized parts
    /// in order, then the open text run, then any in-band error notices.
    pub fn render(&self) -> RenderedDocument {
        self.pipeline.render_parts(
            &self.parts,
            &self.open_text,
            &self.notices,
            self.phase == Phase::Done,
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn parts(&self) -> &[DocumentPart] {
        &self.parts
    }

    /// Consume the assembler, yielding the finalized parts (for appending an
    /// assistant turn to the conversation history).
    pub fn into_parts(self) -> Vec<DocumentPart> {
        self.parts
    }

    fn flush_open_text(&mut self) {
        if !self.open_text.is_empty() {
            let text = std::mem::take(&mut self.open_text);
            self.parts.push(DocumentPart::Text(text));
        }
    }

    fn mark_received(&mut self) {
        if !self.received_content {
            self.received_content = true;
            self.sink.thinking(false);
        }
    }

    fn set_executing(&mut self, on: bool) {
        if self.executing != on {
            self.executing = on;
            self.sink.executing(on);
        }
    }

    fn request_render(&mut self) {
        let document = self.render();
        self.sink.content_appended(&document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NullSink;

    fn assembler() -> StreamAssembler {
        StreamAssembler::new(RenderPipeline::default(), Box::new(NullSink))
    }

    fn feed_records(assembler: &mut StreamAssembler, records: &[&str]) {
        for record in records {
            assembler.feed(format!("{record}\n").as_bytes()).unwrap();
        }
    }

    #[test]
    fn text_runs_coalesce_into_one_part() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"text","content":"Hello, "}"#,
                r#"{"type":"text","content":"world"}"#,
                r#"{"type":"done"}"#,
            ],
        );
        assert_eq!(a.parts(), &[DocumentPart::Text("Hello, world".into())]);
    }

    #[test]
    fn code_finalizes_open_text_first() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"text","content":"Let me compute:"}"#,
                r#"{"type":"code","content":"print(1)"}"#,
            ],
        );
        assert_eq!(
            a.parts(),
            &[
                DocumentPart::Text("Let me compute:".into()),
                DocumentPart::Code("print(1)".into()),
            ]
        );
        assert_eq!(a.phase(), Phase::CodeRunning);
    }

    #[test]
    fn result_returns_phase_to_streaming() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"code","content":"print(1)"}"#,
                r#"{"type":"result","content":"1\n"}"#,
            ],
        );
        assert_eq!(a.phase(), Phase::Streaming);
        assert_eq!(
            a.parts(),
            &[
                DocumentPart::Code("print(1)".into()),
                DocumentPart::Result("1\n".into()),
            ]
        );
    }

    #[test]
    fn duplicate_image_is_discarded() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"image","content":"aGVsbG8="}"#,
                r#"{"type":"image","content":"aGVsbG8="}"#,
            ],
        );
        assert_eq!(a.parts(), &[DocumentPart::Image("aGVsbG8=".into())]);
    }

    #[test]
    fn malformed_record_between_text_deltas_is_skipped() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"text","content":"A"}"#,
                "this is not json",
                r#"{"type":"text","content":"B"}"#,
                r#"{"type":"done"}"#,
            ],
        );
        assert_eq!(a.parts(), &[DocumentPart::Text("AB".into())]);
    }

    #[test]
    fn in_band_error_does_not_clear_parts() {
        let mut a = assembler();
        feed_records(
            &mut a,
            &[
                r#"{"type":"text","content":"partial"}"#,
                r#"{"type":"error","content":"tool crashed"}"#,
                r#"{"type":"text","content":" answer"}"#,
                r#"{"type":"done"}"#,
            ],
        );
        assert_eq!(a.parts(), &[DocumentPart::Text("partial answer".into())]);
        assert!(a.render().html.contains("tool crashed"));
        assert_eq!(a.phase(), Phase::Done);
    }

    #[test]
    fn feed_after_done_is_invalid() {
        let mut a = assembler();
        feed_records(&mut a, &[r#"{"type":"done"}"#]);
        let err = a.feed(b"{\"type\":\"text\",\"content\":\"late\"}\n");
        assert!(matches!(err, Err(WeftError::InvalidState(_))));
    }

    #[test]
    fn records_after_done_in_same_chunk_are_ignored() {
        let mut a = assembler();
        a.feed(
            b"{\"type\":\"text\",\"content\":\"hi\"}\n{\"type\":\"done\"}\n{\"type\":\"text\",\"content\":\"late\"}\n",
        )
        .unwrap();
        assert_eq!(a.parts(), &[DocumentPart::Text("hi".into())]);
        assert_eq!(a.phase(), Phase::Done);
    }

    #[test]
    fn done_sentinel_terminates_like_done_record() {
        let mut a = assembler();
        a.feed(b"data: {\"type\":\"text\",\"content\":\"hi\"}\ndata: [DONE]\n")
            .unwrap();
        assert_eq!(a.phase(), Phase::Done);
        assert_eq!(a.parts(), &[DocumentPart::Text("hi".into())]);
    }

    #[test]
    fn finish_flushes_trailing_text_once() {
        let mut a = assembler();
        feed_records(&mut a, &[r#"{"type":"text","content":"tail"}"#]);
        a.finish();
        a.finish();
        assert_eq!(a.parts(), &[DocumentPart::Text("tail".into())]);
        let first = a.render();
        let second = a.render();
        assert_eq!(first, second);
    }

    #[test]
    fn fail_preserves_parts() {
        let mut a = assembler();
        feed_records(&mut a, &[r#"{"type":"text","content":"kept"}"#]);
        a.fail(&WeftError::endpoint(500, "boom"));
        assert_eq!(a.phase(), Phase::Errored);
        assert!(a.render().html.contains("kept"));
    }
}
