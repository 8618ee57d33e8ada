use serde::Serialize;

use super::entities::EntityImage;

/// Output of one render: the same event phrased for both channels.
///
/// The protocol channel carries references that clients resolve into
/// profile links; the display channel carries plain names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageBundle {
    pub nostr_content: String,
    pub display_content: String,
    /// "⚡ N more spots available. ⚡" style notice, when spots remain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_notice: Option<String>,
    /// Who a newcomer would need to displace, when the herd is full
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityImage>>,
    /// Pubkeys of drawn entities, for p-tagging
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entity_pubkeys: Vec<String>,
    pub spots_remaining: i64,
    /// Relay hint carried by the chosen template
    #[serde(skip)]
    pub reply_relay: Option<String>,
}

impl MessageBundle {
    /// Bundle whose channels carry identical text
    pub fn uniform(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            nostr_content: content.clone(),
            display_content: content,
            ..Default::default()
        }
    }

    /// Capacity and displacement notices as they are appended to content
    pub fn supplemental_text(&self) -> String {
        let mut text = self.capacity_notice.clone().unwrap_or_default();
        if let Some(notice) = &self.displacement_notice {
            text.push(' ');
            text.push_str(notice);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_bundle() {
        let bundle = MessageBundle::uniform("hello");
        assert_eq!(bundle.nostr_content, "hello");
        assert_eq!(bundle.display_content, "hello");
        assert!(bundle.supplemental_text().is_empty());
    }

    #[test]
    fn test_supplemental_text_joins_notices() {
        let bundle = MessageBundle {
            capacity_notice: None,
            displacement_notice: Some("Pay 50 sats to displace Bob.".to_string()),
            ..Default::default()
        };
        assert_eq!(bundle.supplemental_text(), " Pay 50 sats to displace Bob.");

        let bundle = MessageBundle {
            capacity_notice: Some("⚡ 2 more spots available. ⚡".to_string()),
            ..Default::default()
        };
        assert_eq!(bundle.supplemental_text(), "⚡ 2 more spots available. ⚡");
    }

    #[test]
    fn test_serialized_shape_skips_absent_fields() {
        let value = serde_json::to_value(MessageBundle::uniform("x")).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("nostr_content"));
        assert!(!object.contains_key("entities"));
        assert!(!object.contains_key("entity_pubkeys"));
    }
}
