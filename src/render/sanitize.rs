//! Default HTML sanitizer: fixed allow-list of tags and attributes.
//!
//! The example corpus renders untrusted model output by escaping; this
//! filter generalizes that to a tag allow-list so sanitized markdown markup
//! survives while anything else is dropped. The allow-list mirrors the tags
//! and attributes the chat surface actually renders: prose markup, tables,
//! pre/code/span for code blocks, img for generated images, and MathML.

use super::{escape, HtmlSanitize};

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "strong", "em", "b", "i", "u", "s", "del", "blockquote", "ul", "ol", "li",
    "h1", "h2", "h3", "h4", "h5", "h6", "table", "thead", "tbody", "tr", "th", "td", "a", "pre",
    "code", "span", "img", "small", "div", "math", "semantics", "mrow", "mi", "mo", "mn", "msup",
    "msub", "mfrac", "msqrt", "mroot", "mover", "munder", "mtable", "mtr", "mtd", "annotation",
];

const ALLOWED_ATTRS: &[&str] = &[
    "class",
    "style",
    "aria-hidden",
    "encoding",
    "alt",
    "src",
    "href",
];

/// Allow-list sanitizer. Disallowed tags are dropped (their text content
/// survives, except for `script`/`style`, whose content is dropped too);
/// disallowed attributes and unsafe URL schemes are stripped; stray `<`
/// that does not open a tag is escaped.
#[derive(Default)]
pub struct TagAllowList;

enum TagToken {
    Keep(String),
    Drop,
    DropWithContent(String),
}

impl HtmlSanitize for TagAllowList {
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(lt) = rest.find('<') {
            out.push_str(&rest[..lt]);
            let tail = &rest[lt..];
            match read_tag(tail) {
                Some((token, consumed)) => match token {
                    TagToken::Keep(clean) => {
                        out.push_str(&clean);
                        rest = &tail[consumed..];
                    }
                    TagToken::Drop => {
                        rest = &tail[consumed..];
                    }
                    TagToken::DropWithContent(name) => {
                        rest = skip_past_close(&tail[consumed..], &name);
                    }
                },
                None => {
                    out.push_str("&lt;");
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Parse one `<...>` token. Returns the filtered token and the byte length
/// consumed, or `None` when the `<` does not open a well-formed tag.
fn read_tag(tail: &str) -> Option<(TagToken, usize)> {
    let gt = tail.find('>')?;
    let inner = &tail[1..gt];
    let consumed = gt + 1;

    if inner.starts_with('!') || inner.starts_with('?') {
        return Some((TagToken::Drop, consumed));
    }

    let closing = inner.starts_with('/');
    let body = if closing { &inner[1..] } else { inner };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    if !ALLOWED_TAGS.contains(&name.as_str()) {
        if !closing && matches!(name.as_str(), "script" | "style") {
            return Some((TagToken::DropWithContent(name), consumed));
        }
        return Some((TagToken::Drop, consumed));
    }

    if closing {
        return Some((TagToken::Keep(format!("</{name}>")), consumed));
    }

    let self_closing = body.trim_end().ends_with('/');
    let attrs = rebuild_attrs(&body[name.len()..]);
    let clean = if self_closing {
        format!("<{name}{attrs}/>")
    } else {
        format!("<{name}{attrs}>")
    };
    Some((TagToken::Keep(clean), consumed))
}

/// Re-emit only allowed attributes, re-quoted with escaped values.
fn rebuild_attrs(raw: &str) -> String {
    let mut kept = String::new();
    let mut rest = raw.trim();

    while !rest.is_empty() && rest != "/" {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        if name_end == 0 {
            let step = rest.chars().next().map_or(1, char::len_utf8);
            rest = &rest[step..];
            continue;
        }
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let mut value = None;
        if let Some(stripped) = rest.strip_prefix('=') {
            rest = stripped.trim_start();
            if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
                match rest[1..].find(quote) {
                    Some(end) => {
                        value = Some(&rest[1..1 + end]);
                        rest = &rest[end + 2..];
                    }
                    None => {
                        value = Some(&rest[1..]);
                        rest = "";
                    }
                }
            } else {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                value = Some(&rest[..end]);
                rest = &rest[end..];
            }
        }
        rest = rest.trim_start();

        if !ALLOWED_ATTRS.contains(&name.as_str()) {
            continue;
        }
        match value {
            None => kept.push_str(&format!(" {name}")),
            Some(value) if safe_value(&name, value) => {
                kept.push_str(&format!(" {}=\"{}\"", name, escape(value)));
            }
            Some(_) => {}
        }
    }
    kept
}

/// URL-bearing attributes only pass with a safe scheme.
fn safe_value(name: &str, value: &str) -> bool {
    match name {
        "src" => {
            value.starts_with("data:image/")
                || value.starts_with("http://")
                || value.starts_with("https://")
        }
        "href" => {
            value.starts_with("http://")
                || value.starts_with("https://")
                || value.starts_with("mailto:")
                || value.starts_with('#')
        }
        _ => true,
    }
}

/// Skip everything up to and including `</name>` (case-insensitive).
fn skip_past_close<'a>(rest: &'a str, name: &str) -> &'a str {
    let needle = format!("</{name}");
    let lower = rest.to_ascii_lowercase();
    match lower.find(&needle) {
        Some(at) => match rest[at..].find('>') {
            Some(gt) => &rest[at + gt + 1..],
            None => "",
        },
        None => "",
    }
}
