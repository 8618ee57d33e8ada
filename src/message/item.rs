use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Best-effort integer coercion for loosely typed inputs.
///
/// Accepts integers, floats (truncated), numeric strings and booleans.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let text = s.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Text coercion: strings as-is, numbers as their decimal text.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_int))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_text))
}

fn lenient_candidate<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DisplacementCandidate>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

/// The lowest-ranked member a newcomer would have to displace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplacementCandidate {
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub required_sats: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub victim_name: Option<String>,
}

/// Loosely typed item record accompanying an event.
///
/// Every field is optional; which ones matter depends on the event type.
/// Unknown keys are preserved in `extra` so fallback payloads stay complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nprofile: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub new_zap_amount: Option<i64>,

    /// Present when capacity is exhausted
    #[serde(default, deserialize_with = "lenient_candidate", skip_serializing_if = "Option::is_none")]
    pub headbutt_info: Option<DisplacementCandidate>,
    /// Chained after a successful displacement
    #[serde(default, deserialize_with = "lenient_candidate", skip_serializing_if = "Option::is_none")]
    pub next_headbutt_info: Option<DisplacementCandidate>,

    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub required_sats: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<i64>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub attacker_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub attacker_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub attacker_pubkey: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub attacker_nprofile: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub attacker_amount: Option<i64>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub victim_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub victim_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub victim_pubkey: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub victim_nprofile: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub victim_amount: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MessageItem {
    /// Parse from JSON; non-object input yields an empty item.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Event kinds the bundle builder knows how to render
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    CyberHerd,
    NewMember,
    MemberIncrease,
    FeederTriggered,
    FeederTriggerBolt12,
    SatsReceived,
    SatsReceivedZap,
    HeadbuttInfo,
    HeadbuttSuccess,
    HeadbuttFailure,
    CyberHerdTreats,
    DailyReset,
    HerdResetMessage,
    InterfaceInfo,
    Kind6Repost,
    Kind7Reaction,
    Kind6HeadbuttFailure,
    Kind7HeadbuttFailure,
    ZapperDisplacesKind6,
    ZapperDisplacesKind7,
    FeedingRegular,
    FeedingBonus,
    FeedingRemainder,
    FeedingFallback,
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::CyberHerd => "cyber_herd",
            EventType::NewMember => "new_member",
            EventType::MemberIncrease => "member_increase",
            EventType::FeederTriggered => "feeder_triggered",
            EventType::FeederTriggerBolt12 => "feeder_trigger_bolt12",
            EventType::SatsReceived => "sats_received",
            EventType::SatsReceivedZap => "sats_received_zap",
            EventType::HeadbuttInfo => "headbutt_info",
            EventType::HeadbuttSuccess => "headbutt_success",
            EventType::HeadbuttFailure => "headbutt_failure",
            EventType::CyberHerdTreats => "cyber_herd_treats",
            EventType::DailyReset => "daily_reset",
            EventType::HerdResetMessage => "herd_reset_message",
            EventType::InterfaceInfo => "interface_info",
            EventType::Kind6Repost => "kind_6_repost",
            EventType::Kind7Reaction => "kind_7_reaction",
            EventType::Kind6HeadbuttFailure => "kind_6_headbutt_failure",
            EventType::Kind7HeadbuttFailure => "kind_7_headbutt_failure",
            EventType::ZapperDisplacesKind6 => "zapper_displaces_kind_6",
            EventType::ZapperDisplacesKind7 => "zapper_displaces_kind_7",
            EventType::FeedingRegular => "feeding_regular",
            EventType::FeedingBonus => "feeding_bonus",
            EventType::FeedingRemainder => "feeding_remainder",
            EventType::FeedingFallback => "feeding_fallback",
            EventType::Unknown(name) => name,
        }
    }

    /// Join-style events that carry capacity notices
    pub fn is_membership_join(&self) -> bool {
        matches!(self, EventType::CyberHerd | EventType::NewMember)
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "cyber_herd" => EventType::CyberHerd,
            "new_member" => EventType::NewMember,
            "member_increase" => EventType::MemberIncrease,
            "feeder_triggered" => EventType::FeederTriggered,
            "feeder_trigger_bolt12" => EventType::FeederTriggerBolt12,
            "sats_received" => EventType::SatsReceived,
            "sats_received_zap" => EventType::SatsReceivedZap,
            "headbutt_info" => EventType::HeadbuttInfo,
            "headbutt_success" => EventType::HeadbuttSuccess,
            "headbutt_failure" => EventType::HeadbuttFailure,
            "cyber_herd_treats" => EventType::CyberHerdTreats,
            "daily_reset" => EventType::DailyReset,
            "herd_reset_message" => EventType::HerdResetMessage,
            "interface_info" => EventType::InterfaceInfo,
            "kind_6_repost" => EventType::Kind6Repost,
            "kind_7_reaction" => EventType::Kind7Reaction,
            "kind_6_headbutt_failure" => EventType::Kind6HeadbuttFailure,
            "kind_7_headbutt_failure" => EventType::Kind7HeadbuttFailure,
            "zapper_displaces_kind_6" => EventType::ZapperDisplacesKind6,
            "zapper_displaces_kind_7" => EventType::ZapperDisplacesKind7,
            "feeding_regular" => EventType::FeedingRegular,
            "feeding_bonus" => EventType::FeedingBonus,
            "feeding_remainder" => EventType::FeedingRemainder,
            "feeding_fallback" => EventType::FeedingFallback,
            other => EventType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threaded reply into a live container event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyContext {
    pub container_event_id: Option<String>,
    pub container_ref: Option<String>,
}

impl ReplyContext {
    pub fn container(event_id: impl Into<String>, coordinate: impl Into<String>) -> Self {
        Self {
            container_event_id: Some(event_id.into()),
            container_ref: Some(coordinate.into()),
        }
    }

    /// Both the container event id and its coordinate are present
    pub fn is_container_reply(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.container_event_id) && present(&self.container_ref)
    }
}

/// Inputs for one bundle render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub event_type: EventType,
    pub new_amount: i64,
    pub difference: i64,
    pub item: MessageItem,
    pub spots_remaining: i64,
    pub reply: ReplyContext,
}

impl RenderRequest {
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            new_amount: 0,
            difference: 0,
            item: MessageItem::default(),
            spots_remaining: 0,
            reply: ReplyContext::default(),
        }
    }

    pub fn with_amounts(mut self, new_amount: i64, difference: i64) -> Self {
        self.new_amount = new_amount;
        self.difference = difference;
        self
    }

    pub fn with_item(mut self, item: MessageItem) -> Self {
        self.item = item;
        self
    }

    pub fn with_spots_remaining(mut self, spots_remaining: i64) -> Self {
        self.spots_remaining = spots_remaining;
        self
    }

    pub fn with_reply(mut self, reply: ReplyContext) -> Self {
        self.reply = reply;
        self
    }
}

impl From<EventType> for RenderRequest {
    fn from(event_type: EventType) -> Self {
        Self::new(event_type)
    }
}
