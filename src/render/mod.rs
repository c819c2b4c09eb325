//! Rendering seams and the document-to-HTML mapping.
//!
//! The three external capabilities (markdown conversion, HTML sanitization,
//! syntax highlighting) are consumed through traits and injected into the
//! assembler by construction. The crate ships default implementations, but a
//! host can swap any of them.

pub mod highlight;
pub mod markdown;
pub mod sanitize;

pub use highlight::Syntect;
pub use markdown::CommonMark;
pub use sanitize::TagAllowList;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bon::Builder;

use crate::types::{DocumentPart, RenderedDocument};

/// Markdown-to-HTML conversion. Pure function: text in, HTML out.
///
/// When a highlighter is supplied, fenced code blocks are highlighted;
/// otherwise they render verbatim-escaped.
pub trait MarkdownRender: Send + Sync {
    fn render(&self, markdown: &str, highlighter: Option<&dyn HighlightCode>) -> String;
}

/// HTML sanitization with a fixed allow-list of tags and attributes.
/// Pure function: HTML in, HTML out. Raw model/user text is never trusted;
/// every rendered fragment passes through this stage before it reaches a
/// display surface.
pub trait HtmlSanitize: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Syntax highlighting. Source text plus a language tag in, HTML out.
pub trait HighlightCode: Send + Sync {
    fn highlight(&self, source: &str, language: &str) -> String;
}

fn default_markdown() -> Arc<dyn MarkdownRender> {
    Arc::new(CommonMark::default())
}

fn default_sanitizer() -> Arc<dyn HtmlSanitize> {
    Arc::new(TagAllowList)
}

fn default_highlighter() -> Arc<dyn HighlightCode> {
    Arc::new(Syntect::default())
}

/// The capability bundle handed to an assembler at construction.
#[derive(Clone, Builder)]
pub struct RenderPipeline {
    #[builder(default = default_markdown())]
    pub markdown: Arc<dyn MarkdownRender>,
    #[builder(default = default_sanitizer())]
    pub sanitizer: Arc<dyn HtmlSanitize>,
    #[builder(default = default_highlighter())]
    pub highlighter: Arc<dyn HighlightCode>,
    /// Language tag for executable code blocks arriving as `code` events.
    #[builder(default = "python".to_string())]
    pub code_language: String,
    /// Label shown above an executable code block.
    #[builder(default = "Python Code:".to_string())]
    pub code_label: String,
    /// Label shown above an execution result block.
    #[builder(default = "Code Output:".to_string())]
    pub result_label: String,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RenderPipeline {
    /// Deterministically map parts (plus any still-open text run and in-band
    /// error notices) to sanitized HTML.
    ///
    /// `Code` parts are always highlighted. `finalized` enables the final
    /// highlighting pass over fenced code inside markdown, which renders
    /// verbatim-escaped while the stream is still open. `Result` parts
    /// render verbatim-escaped in every mode.
    pub fn render_parts(
        &self,
        parts: &[DocumentPart],
        open_text: &str,
        notices: &[String],
        finalized: bool,
    ) -> RenderedDocument {
        let highlighter = finalized.then(|| self.highlighter.as_ref());
        let mut html = String::new();

        for part in parts {
            match part {
                DocumentPart::Text(text) => {
                    html.push_str(&self.markdown.render(text, highlighter));
                }
                DocumentPart::Code(source) => {
                    self.push_code_block(&mut html, source);
                }
                DocumentPart::Result(output) => {
                    html.push_str(&format!(
                        "<div class=\"code-result\"><small>{}</small>\
                         <pre class=\"output-pre\"><code class=\"output-code\">{}</code></pre></div>",
                        escape(&self.result_label),
                        escape(output),
                    ));
                }
                DocumentPart::Image(data) => {
                    self.push_image(&mut html, data);
                }
            }
        }

        if !open_text.is_empty() {
            html.push_str(&self.markdown.render(open_text, highlighter));
        }

        for notice in notices {
            html.push_str(&format!(
                "<p class=\"stream-error\"><strong>Error:</strong> {}</p>",
                escape(notice),
            ));
        }

        RenderedDocument {
            html: self.sanitizer.sanitize(&html),
            part_count: parts.len(),
        }
    }

    fn push_code_block(&self, html: &mut String, source: &str) {
        let body = self.highlighter.highlight(source, &self.code_language);
        html.push_str(&format!(
            "<div class=\"code-block\"><small>{}</small>\
             <pre><code class=\"language-{}\">{}</code></pre></div>",
            escape(&self.code_label),
            escape(&self.code_language),
            body,
        ));
    }

    fn push_image(&self, html: &mut String, data: &str) {
        if BASE64.decode(data).is_err() {
            html.push_str(
                "<p class=\"stream-error\"><strong>Error:</strong> invalid image payload</p>",
            );
            return;
        }
        html.push_str(&format!(
            "<img src=\"data:image/png;base64,{data}\" alt=\"Generated Image\"/>",
        ));
    }
}

/// Minimal HTML escaping for text destined for element content or
/// double-quoted attribute values.
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
