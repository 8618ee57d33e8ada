use serde::Serialize;
use serde_json::{Map, Value};

use crate::message::{
    coerce_int, coerce_text, EntityImage, EventType, MessageBundle, MessageItem, RenderRequest,
    ReplyContext,
};
use crate::nostr::Tag;
use crate::publish::SigningSelector;
use crate::template::TemplateScope;

/// Render a stored template with caller-supplied values
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderRequest {
    /// Owner whose templates take precedence over global ones
    pub owner: Option<String>,
    pub category: String,
    pub key: String,
    pub values: Map<String, Value>,
    pub reply: ReplyContext,
    /// Explicit relay hint; wins over any hint stored with the template
    pub relay_hint: Option<String>,
}

impl TemplateRenderRequest {
    pub fn new(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Build from a JSON value; anything but an object yields no values.
    pub fn from_values(
        owner: Option<&str>,
        category: impl Into<String>,
        key: impl Into<String>,
        values: &Value,
    ) -> Self {
        Self {
            owner: owner.map(str::to_string),
            category: category.into(),
            key: key.into(),
            values: values.as_object().cloned().unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_reply(mut self, reply: ReplyContext) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_relay_hint(mut self, relay_hint: impl Into<String>) -> Self {
        self.relay_hint = Some(relay_hint.into());
        self
    }

    /// Scopes to search, most specific first
    pub(crate) fn scopes(&self) -> Vec<TemplateScope> {
        match self.owner.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            Some(owner) => vec![TemplateScope::owner(owner), TemplateScope::Global],
            None => vec![TemplateScope::Global],
        }
    }

    /// Join-style membership render implied by the values, if any.
    ///
    /// Item fields win over top-level values; amounts and counts are coerced
    /// leniently.
    pub(crate) fn membership_request(&self) -> Option<RenderRequest> {
        let values = &self.values;
        let event_type = first_text(values, &["_semantic_event_type", "event_type", "type"])
            .map(|name| EventType::from(name.as_str()))?;
        if !event_type.is_membership_join() {
            return None;
        }

        let mut item = values
            .get("cyber_herd_item")
            .map(MessageItem::from_value)
            .unwrap_or_default();

        if item.display_name.is_none() {
            item.display_name = Some(
                first_text(values, &["member_display_name", "display_name", "name"])
                    .unwrap_or_else(|| "Anon".to_string()),
            );
        }
        if item.pubkey.is_none() {
            item.pubkey = first_text(values, &["member_pubkey", "pubkey"]);
        }
        if item.nprofile.is_none() {
            item.nprofile = first_text(values, &["member_nprofile", "nprofile"]);
        }
        if item.event_id.is_none() {
            item.event_id = first_text(values, &["event_id", "note_id"]);
        }
        if item.amount.is_none() {
            item.amount = Some(
                first_int(values, &["initial_amount", "new_amount", "amount", "increase_amount"])
                    .unwrap_or(0),
            );
        }
        if item.headbutt_info.is_none() {
            item.headbutt_info = values
                .get("headbutt_info")
                .filter(|v| v.is_object())
                .and_then(|v| serde_json::from_value(v.clone()).ok());
        }

        let new_amount = first_int(values, &["new_amount", "initial_amount"])
            .or(item.amount)
            .unwrap_or(0);
        let difference = first_int(values, &["difference"]).unwrap_or(0);
        let spots_remaining = first_int(values, &["spots_remaining", "_spots_remaining"]).unwrap_or(0);

        Some(
            RenderRequest::new(event_type)
                .with_amounts(new_amount, difference)
                .with_item(item)
                .with_spots_remaining(spots_remaining)
                .with_reply(self.reply.clone()),
        )
    }
}

fn first_text(values: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| values.get(*key))
        .filter_map(coerce_text)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn first_int(values: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| values.get(*key))
        .find(|v| !v.is_null())
        .and_then(coerce_int)
}

/// Publishing inputs that do not come from the template itself
#[derive(Debug, Clone, Default)]
pub struct TemplatePublishOptions {
    pub tags: Vec<Tag>,
    pub event_ids: Vec<String>,
    pub pubkeys: Vec<String>,
    pub signing: Option<SigningSelector>,
}

impl TemplatePublishOptions {
    pub fn signed_with(signing: SigningSelector) -> Self {
        Self {
            signing: Some(signing),
            ..Default::default()
        }
    }

    pub fn with_event_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pubkeys<I, S>(mut self, pubkeys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pubkeys = pubkeys.into_iter().map(Into::into).collect();
        self
    }
}

/// A stored template rendered for both channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedTemplate {
    pub nostr_content: String,
    pub display_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityImage>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entity_pubkeys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_relay: Option<String>,
}

/// JSON frame pushed to the display feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goat_data: Option<Vec<EntityImage>>,
    pub spots_remaining: i64,
}

impl DisplayPayload {
    pub fn from_bundle(event_type: &str, bundle: &MessageBundle) -> Self {
        Self {
            event_type: event_type.to_string(),
            message: bundle.display_content.clone(),
            goat_data: bundle.entities.clone(),
            spots_remaining: bundle.spots_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_values_ignores_non_objects() {
        let request = TemplateRenderRequest::from_values(None, "c", "k", &json!([1, 2]));
        assert!(request.values.is_empty());
        assert_eq!(request.scopes(), vec![TemplateScope::Global]);
    }

    #[test]
    fn test_scopes_owner_first() {
        let request = TemplateRenderRequest::new("c", "k").with_owner("wallet-1");
        assert_eq!(
            request.scopes(),
            vec![TemplateScope::owner("wallet-1"), TemplateScope::Global]
        );
    }

    #[test]
    fn test_membership_request_from_values() {
        let request = TemplateRenderRequest::from_values(
            None,
            "cyber_herd_join",
            "0",
            &json!({
                "event_type": "new_member",
                "member_display_name": "Alice",
                "initial_amount": "210",
                "difference": 790.0,
                "spots_remaining": "0",
                "headbutt_info": {"required_sats": 50, "victim_name": "Bob"},
                "cyber_herd_item": {"pubkey": "abc"}
            }),
        );

        let render = request.membership_request().unwrap();
        assert_eq!(render.event_type, EventType::NewMember);
        assert_eq!(render.item.display_name.as_deref(), Some("Alice"));
        assert_eq!(render.item.pubkey.as_deref(), Some("abc"));
        assert_eq!(render.item.amount, Some(210));
        assert_eq!(render.new_amount, 210);
        assert_eq!(render.difference, 790);
        assert_eq!(render.spots_remaining, 0);
        assert_eq!(
            render.item.headbutt_info.unwrap().victim_name.as_deref(),
            Some("Bob")
        );
    }

    #[test]
    fn test_non_membership_values_do_not_augment() {
        let request = TemplateRenderRequest::new("daily_reset", "0").with_value("type", "daily_reset");
        assert!(request.membership_request().is_none());
        assert!(TemplateRenderRequest::new("c", "k").membership_request().is_none());
    }

    #[test]
    fn test_display_payload_shape() {
        let bundle = MessageBundle {
            display_content: "Fed Nova".to_string(),
            entities: Some(vec![EntityImage::new("Nova", None)]),
            spots_remaining: 2,
            ..Default::default()
        };
        let value = serde_json::to_value(DisplayPayload::from_bundle("feeder_triggered", &bundle)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "feeder_triggered",
                "message": "Fed Nova",
                "goat_data": [{"name": "Nova", "imageUrl": "images/nova.png"}],
                "spots_remaining": 2
            })
        );
    }
}
