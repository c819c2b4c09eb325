//! Convenience re-exports for common use.

pub use crate::assembler::{Phase, StreamAssembler};
pub use crate::config::WeftConfig;
pub use crate::error::{Result, WeftError};
pub use crate::render::{
    CommonMark, HighlightCode, HtmlSanitize, MarkdownRender, RenderPipeline, Syntect, TagAllowList,
};
pub use crate::session::{ChatSession, NullSink, PresentationSink, ScrollState};
pub use crate::transport::{ChatRequest, HttpTransport, StreamTransport};
pub use crate::types::{ChatMessage, ContentEvent, DocumentPart, RenderedDocument, Role};
pub use crate::util::RetryPolicy;
