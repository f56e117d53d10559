use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned message identifier.
///
/// Identity is textual: `"7"` and `7` on the wire decode to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match WireId::deserialize(deserializer)? {
            WireId::Text(raw) => Self(raw),
            WireId::Signed(raw) => Self(raw.to_string()),
            WireId::Unsigned(raw) => Self(raw.to_string()),
        })
    }
}

/// Server-assigned creation timestamp.
///
/// The raw string is kept verbatim so it can be echoed back as the `after`
/// cursor without reformatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedAt(String);

impl CreatedAt {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the RFC 3339 form; `None` for anything else.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.0.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    /// Chronological comparison, falling back to byte order when either side
    /// is not a parseable timestamp.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        match (self.to_datetime(), other.to_datetime()) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => self.0.cmp(&other.0),
        }
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self.chronological_cmp(other) == Ordering::Greater
    }
}

impl fmt::Display for CreatedAt {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for CreatedAt {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CreatedAt {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One confirmed message from the remote stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub author: String,
    #[serde(rename = "message")]
    pub text: String,
    pub created_at: CreatedAt,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        author: impl Into<String>,
        text: impl Into<String>,
        created_at: impl Into<CreatedAt>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            text: text.into(),
            created_at: created_at.into(),
        }
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    #[serde(rename = "message")]
    pub text: String,
    pub author: String,
}

impl NewMessage {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_decodes_wire_field_names() {
        let payload = r#"{
            "id": "1",
            "message": "Hello",
            "author": "Alice",
            "createdAt": "2024-01-01T10:00:00Z"
        }"#;

        let message: Message = serde_json::from_str(payload).expect("decode message");

        assert_eq!(message.id, MessageId::new("1"));
        assert_eq!(message.text, "Hello");
        assert_eq!(message.author, "Alice");
        assert_eq!(message.created_at.as_str(), "2024-01-01T10:00:00Z");
    }

    #[test]
    fn numeric_ids_decode_to_the_same_textual_identity() {
        let numeric: Message = serde_json::from_str(
            r#"{"id": 42, "message": "a", "author": "b", "createdAt": "T1"}"#,
        )
        .expect("decode numeric id");
        let textual: Message = serde_json::from_str(
            r#"{"id": "42", "message": "a", "author": "b", "createdAt": "T1"}"#,
        )
        .expect("decode textual id");

        assert_eq!(numeric.id, textual.id);
    }

    #[test]
    fn new_message_serializes_text_as_message_field() {
        let body = serde_json::to_value(NewMessage::new("Test message", "Alice"))
            .expect("encode body");

        assert_eq!(
            body,
            serde_json::json!({ "message": "Test message", "author": "Alice" })
        );
    }

    #[test]
    fn created_at_orders_by_instant_across_offsets() {
        let utc = CreatedAt::new("2024-01-01T10:00:00Z");
        let later_in_offset = CreatedAt::new("2024-01-01T11:30:00+01:00");

        assert!(later_in_offset.is_after(&utc));
        assert!(!utc.is_after(&later_in_offset));
    }

    #[test]
    fn created_at_falls_back_to_byte_order_for_opaque_values() {
        assert!(CreatedAt::new("T2").is_after(&CreatedAt::new("T1")));
        assert!(CreatedAt::new("T1").to_datetime().is_none());
    }
}
