//! Default markdown renderer on pulldown-cmark.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::{escape, HighlightCode, MarkdownRender};

/// CommonMark renderer with GFM tables and strikethrough enabled.
///
/// Raw HTML embedded in the markdown is escaped to text; model output is
/// never trusted as markup. Fenced code blocks are emitted as
/// `<pre><code class="language-…">`, highlighted when a highlighter is
/// supplied and verbatim-escaped otherwise.
pub struct CommonMark {
    options: Options,
}

impl Default for CommonMark {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }
}

impl MarkdownRender for CommonMark {
    fn render(&self, markdown: &str, highlighter: Option<&dyn HighlightCode>) -> String {
        let parser = Parser::new_ext(markdown, self.options);

        let mut out = String::new();
        let mut pending: Vec<Event> = Vec::new();
        let mut code: Option<(String, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    html::push_html(&mut out, pending.drain(..));
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang.into_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, source)) = code.take() {
                        push_code_block(&mut out, &lang, &source, highlighter);
                    }
                }
                Event::Text(text) => {
                    if let Some((_, buffer)) = code.as_mut() {
                        buffer.push_str(&text);
                    } else {
                        pending.push(Event::Text(text));
                    }
                }
                // Untrusted inline markup becomes plain text.
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    pending.push(Event::Text(raw));
                }
                other => pending.push(other),
            }
        }
        html::push_html(&mut out, pending.drain(..));

        out
    }
}

fn push_code_block(
    out: &mut String,
    lang: &str,
    source: &str,
    highlighter: Option<&dyn HighlightCode>,
) {
    let class_lang = if lang.is_empty() { "text" } else { lang };
    out.push_str(&format!(
        "<pre><code class=\"language-{}\">",
        escape(class_lang)
    ));
    match highlighter {
        Some(h) => out.push_str(&h.highlight(source, lang)),
        None => out.push_str(&escape(source)),
    }
    out.push_str("</code></pre>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        CommonMark::default().render(markdown, None)
    }

    #[test]
    fn renders_basic_prose() {
        let html = render("Some **bold** text");
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn renders_tables() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn escapes_raw_html() {
        let html = render("before <script>alert(1)</script> after");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn fenced_block_without_highlighter_is_escaped() {
        let html = render("```python\nx < 1\n```");
        assert!(html.contains("<code class=\"language-python\">"));
        assert!(html.contains("x &lt; 1"));
    }

    #[test]
    fn fenced_block_with_highlighter_delegates() {
        struct Upper;
        impl HighlightCode for Upper {
            fn highlight(&self, source: &str, _language: &str) -> String {
                source.to_uppercase()
            }
        }
        let html = CommonMark::default().render("```rust\nfn main() {}\n```", Some(&Upper));
        assert!(html.contains("FN MAIN() {}"));
    }

    #[test]
    fn unclosed_fence_still_renders() {
        // Mid-stream markdown can end inside an open fence; the partial
        // block renders rather than disappearing.
        let html = render("intro\n```python\nx = 1\n");
        assert!(html.contains("intro"));
        assert!(html.contains("x = 1"));
    }
}
