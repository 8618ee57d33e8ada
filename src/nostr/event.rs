use serde::{Deserialize, Serialize};

use super::tags::Tag;

/// Short text note (NIP-01)
pub const KIND_TEXT_NOTE: u16 = 1;

/// Live activity chat message (NIP-53)
pub const KIND_LIVE_CHAT_MESSAGE: u16 = 1311;

/// The (kind, tags, content) triple handed to a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedNote {
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl UnsignedNote {
    /// Build a note, choosing the kind from the tags: a live container
    /// reference makes it a live chat message, otherwise a text note.
    pub fn new(content: impl Into<String>, tags: Vec<Tag>) -> Self {
        let kind = if tags.iter().any(Tag::is_live_container) {
            KIND_LIVE_CHAT_MESSAGE
        } else {
            KIND_TEXT_NOTE
        };
        Self {
            kind,
            tags,
            content: content.into(),
        }
    }
}

/// A signed event in NIP-01 wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

impl SignedEvent {
    /// `["EVENT", <event>]` relay message
    pub fn to_message(&self) -> serde_json::Value {
        serde_json::json!(["EVENT", self])
    }

    /// First 8 characters of the id, for log lines
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_tags() {
        let note = UnsignedNote::new("gm", vec![Tag::pubkey("ab")]);
        assert_eq!(note.kind, KIND_TEXT_NOTE);

        let live = UnsignedNote::new(
            "gm",
            vec![Tag::address("30311:abc:stream")],
        );
        assert_eq!(live.kind, KIND_LIVE_CHAT_MESSAGE);

        let other_address = UnsignedNote::new("gm", vec![Tag::address("30023:abc:post")]);
        assert_eq!(other_address.kind, KIND_TEXT_NOTE);
    }

    #[test]
    fn test_wire_message() {
        let event = SignedEvent {
            id: "0123456789abcdef".to_string(),
            pubkey: "pk".to_string(),
            created_at: 1_700_000_000,
            kind: KIND_TEXT_NOTE,
            tags: vec![Tag::new(["t", "goats"])],
            content: "hello".to_string(),
            sig: "sig".to_string(),
        };

        let message = event.to_message();
        assert_eq!(message[0], "EVENT");
        assert_eq!(message[1]["kind"], 1);
        assert_eq!(message[1]["tags"][0][1], "goats");
        assert_eq!(event.short_id(), "01234567");
    }
}
