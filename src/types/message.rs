//! Conversation history types for the outbound request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentPart;

/// A message in a conversation, as posted to the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<DocumentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a user message from plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![DocumentPart::Text(text.into())],
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant message from already-assembled parts.
    pub fn assistant(parts: Vec<DocumentPart>) -> Self {
        Self {
            role: Role::Assistant,
            parts,
            timestamp: Some(Utc::now()),
        }
    }

    /// Extract the text content, concatenating all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                DocumentPart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_serializes_with_role_and_parts() {
        let msg = ChatMessage::user("plot the data");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["type"], "text");
        assert_eq!(json["parts"][0]["content"], "plot the data");
    }

    #[test]
    fn text_skips_non_text_parts() {
        let msg = ChatMessage::assistant(vec![
            DocumentPart::Text("see ".into()),
            DocumentPart::Code("print(1)".into()),
            DocumentPart::Text("above".into()),
        ]);
        assert_eq!(msg.text(), "see above");
    }
}
