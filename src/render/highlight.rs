//! Default syntax highlighter on syntect.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::{escape, HighlightCode};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Highlighter emitting inline-styled HTML spans.
///
/// Unknown language tags fall back to plain text; a line the highlighter
/// chokes on falls back to escaped text, so output is always well-formed.
pub struct Syntect {
    theme_name: String,
}

impl Syntect {
    pub fn new(theme_name: impl Into<String>) -> Self {
        Self {
            theme_name: theme_name.into(),
        }
    }

    fn theme(&self) -> &'static Theme {
        let themes = &theme_set().themes;
        themes
            .get(&self.theme_name)
            .or_else(|| themes.get("InspiredGitHub"))
            .unwrap_or_else(|| themes.values().next().expect("syntect default themes"))
    }
}

impl Default for Syntect {
    fn default() -> Self {
        Self::new("InspiredGitHub")
    }
}

impl HighlightCode for Syntect {
    fn highlight(&self, source: &str, language: &str) -> String {
        let ss = syntax_set();
        let syntax = ss
            .find_syntax_by_token(language)
            .or_else(|| ss.find_syntax_by_extension(language))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, self.theme());
        let mut html = String::new();
        for line in LinesWithEndings::from(source) {
            match highlighter.highlight_line(line, ss) {
                Ok(regions) => html.push_str(
                    &styled_line_to_highlighted_html(&regions, IncludeBackground::No)
                        .unwrap_or_else(|_| escape(line)),
                ),
                Err(_) => html.push_str(&escape(line)),
            }
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language() {
        let html = Syntect::default().highlight("let x = 1;", "rust");
        assert!(html.contains("<span style="));
        assert!(html.contains("x"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let html = Syntect::default().highlight("just words < here", "no-such-lang");
        // Plain-text grammar still styles via spans but must escape markup.
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn unknown_theme_falls_back() {
        let html = Syntect::new("no-such-theme").highlight("x = 1", "python");
        assert!(!html.is_empty());
    }
}
