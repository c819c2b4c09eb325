//! The materialized document assembled from a stream.

use serde::{Deserialize, Serialize};

/// An ordered entry in the materialized document.
///
/// Insertion order is rendering order. Consecutive text events are coalesced
/// into a single `Text` part before it is finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum DocumentPart {
    Text(String),
    Code(String),
    Result(String),
    Image(String),
}

/// A rendered snapshot of the document, ready for a display surface.
///
/// `html` has already passed the sanitizing stage; the presentation layer
/// must not feed unsanitized fragments around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Sanitized HTML for the whole document, parts in order followed by any
    /// in-band error notices.
    pub html: String,
    /// Number of finalized parts the snapshot covers (the open text run, if
    /// any, is rendered but not counted here).
    pub part_count: usize,
}

impl RenderedDocument {
    pub fn empty() -> Self {
        Self {
            html: String::new(),
            part_count: 0,
        }
    }
}
