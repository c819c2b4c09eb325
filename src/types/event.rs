//! Wire-level content events.

use serde::{Deserialize, Serialize};

/// One decoded record of the incremental transport.
///
/// Records arrive as `{"type": "...", "content": "..."}` JSON objects, either
/// bare (NDJSON) or behind an SSE `data:` prefix. `done` carries no payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ContentEvent {
    /// An incremental fragment of prose/markdown for the open text run.
    Text(String),
    /// A complete code block beginning a code-execution phase.
    Code(String),
    /// The output of the most recently opened code-execution phase.
    Result(String),
    /// A base64-encoded image payload.
    Image(String),
    /// An in-band, non-fatal error message.
    Error(String),
    /// End of stream.
    Done,
}

impl ContentEvent {
    /// Decode one record's JSON payload.
    pub fn from_record(record: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(record)
    }
}
