use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Entry types that carry session metadata rather than conversation
/// content. Everything that is not a `message` is treated as structural,
/// so unknown future types survive truncation untouched.
pub const STRUCTURAL_TYPES: &[&str] = &[
    "session",
    "model_change",
    "thinking_level_change",
    "custom",
    "compaction",
];

pub const MESSAGE_TYPE: &str = "message";
pub const COMPACTION_TYPE: &str = "compaction";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: Value,
}

/// One line of the host's append-only session log.
///
/// The host owns this format; we only rewrite whole files. Unknown sibling
/// fields round-trip through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<SessionMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionEntry {
    pub fn is_content(&self) -> bool {
        self.entry_type == MESSAGE_TYPE
    }

    pub fn is_structural(&self) -> bool {
        !self.is_content()
    }

    /// Character count of the conversational content: the string content's
    /// length, or the summed length of text blocks.
    pub fn content_chars(&self) -> usize {
        let Some(message) = &self.message else {
            return 0;
        };
        match &message.content {
            Value::String(s) => s.len(),
            Value::Array(blocks) => blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .map(str::len)
                .sum(),
            _ => 0,
        }
    }

    /// Synthetic marker inserted where older content was dropped.
    pub fn compaction_marker(removed: usize, timestamp: impl Into<String>) -> Self {
        let text = format!(
            "[Session compacted: removed {} older messages to stay within the context window]",
            removed
        );
        Self {
            entry_type: COMPACTION_TYPE.to_string(),
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            timestamp: Some(timestamp.into()),
            message: Some(SessionMessage {
                role: "system".to_string(),
                content: Value::String(text),
            }),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_entry(id: &str, parent: Option<&str>, content: Value) -> SessionEntry {
        SessionEntry {
            entry_type: MESSAGE_TYPE.to_string(),
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            timestamp: Some("2026-08-02T10:00:00Z".to_string()),
            message: Some(SessionMessage {
                role: "assistant".to_string(),
                content,
            }),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_content_chars_string() {
        let entry = message_entry("a", None, json!("hello world"));
        assert_eq!(entry.content_chars(), 11);
    }

    #[test]
    fn test_content_chars_blocks() {
        let entry = message_entry(
            "a",
            None,
            json!([
                {"type": "text", "text": "hello"},
                {"type": "image", "source": "..."},
                {"type": "text", "text": "world"}
            ]),
        );
        assert_eq!(entry.content_chars(), 10);
    }

    #[test]
    fn test_structural_partition() {
        let msg = message_entry("a", None, json!("x"));
        assert!(msg.is_content());

        let mut structural = msg.clone();
        structural.entry_type = "model_change".to_string();
        assert!(structural.is_structural());

        // Unknown types are preserved as structural.
        structural.entry_type = "future_thing".to_string();
        assert!(structural.is_structural());
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let line = r#"{"type":"message","id":"e1","parentId":null,"timestamp":"2026-08-02T10:00:00Z","message":{"role":"user","content":"hi"},"customField":42}"#;
        let entry: SessionEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.extra.get("customField"), Some(&json!(42)));

        let out = serde_json::to_string(&entry).unwrap();
        assert!(out.contains("customField"));
    }

    #[test]
    fn test_compaction_marker_shape() {
        let marker = SessionEntry::compaction_marker(12, "2026-08-02T10:00:00Z");
        assert_eq!(marker.entry_type, COMPACTION_TYPE);
        assert!(marker.is_structural());
        let msg = marker.message.unwrap();
        assert_eq!(msg.role, "system");
        assert!(msg.content.as_str().unwrap().contains("removed 12 older"));
    }
}
