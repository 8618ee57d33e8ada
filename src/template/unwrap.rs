//! Recovery of template bodies stored as serialized wrappers.
//!
//! Older rows hold `{content, reply_relay}` as JSON, as a single-quoted
//! literal dict, or as loosely quoted text. The cascade is: strict JSON,
//! literal parse, quote repair, strict field regex, loose field regex. A body
//! that still looks like a wrapper is discarded rather than published raw.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::literal::{parse_literal, unescape};
use super::types::TemplateEntry;

lazy_static! {
    static ref STRICT_CONTENT: Regex =
        Regex::new(r#"(?s)['"]content['"]\s*:\s*['"](.*?)['"]\s*(?:,|\})"#).unwrap();
    static ref STRICT_RELAY: Regex =
        Regex::new(r#"(?s)['"]reply_relay['"]\s*:\s*['"](.*?)['"]\s*(?:,|\})"#).unwrap();
    static ref LOOSE_CONTENT: Regex =
        Regex::new(r#"(?s)content\s*:\s*(?:'(.*?)'|"(.*?)"|(.*?))\s*(?:,|\})"#).unwrap();
    static ref LOOSE_RELAY: Regex =
        Regex::new(r#"(?s)reply_relay\s*:\s*(?:'(.*?)'|"(.*?)"|(.*?))\s*(?:,|\})"#).unwrap();
}

/// Turn a stored body into a [`TemplateEntry`].
///
/// Plain text is returned unchanged. A wrapper with no recoverable `content`
/// yields empty content.
pub fn unwrap_stored_body(raw: &str) -> TemplateEntry {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return TemplateEntry::new(raw);
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(entry) = entry_from_value(&value) {
            return entry;
        }
    }

    if let Some(entry) = parse_literal(trimmed).as_ref().and_then(entry_from_value) {
        return entry;
    }

    if trimmed.ends_with('}') {
        let repaired = trimmed.replace('\'', "\"");
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            if let Some(entry) = entry_from_value(&value) {
                return entry;
            }
        }
    }

    if let Some(entry) = extract_fields(trimmed) {
        return entry;
    }

    if trimmed.ends_with('}') && trimmed.contains(':') {
        let preview: String = trimmed.chars().take(200).collect();
        tracing::warn!(
            body = %preview,
            "Stored template looks like a serialized structure without content, discarding"
        );
        return TemplateEntry::new("");
    }

    TemplateEntry::new(raw)
}

fn entry_from_value(value: &Value) -> Option<TemplateEntry> {
    let map = value.as_object()?;
    let content = match map.get("content")? {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let reply_relay = map
        .get("reply_relay")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|relay| !relay.is_empty())
        .map(str::to_string);
    Some(TemplateEntry {
        content,
        reply_relay,
    })
}

fn first_group(caps: &regex::Captures<'_>) -> Option<String> {
    (1..caps.len())
        .find_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
}

fn extract_fields(text: &str) -> Option<TemplateEntry> {
    let strict = STRICT_CONTENT
        .captures(text)
        .and_then(|caps| first_group(&caps))
        .map(|content| unescape(&content))
        .filter(|content| !content.is_empty());

    if let Some(content) = strict {
        let reply_relay = STRICT_RELAY
            .captures(text)
            .and_then(|caps| first_group(&caps))
            .map(|relay| relay.trim().to_string())
            .filter(|relay| !relay.is_empty());
        return Some(TemplateEntry {
            content,
            reply_relay,
        });
    }

    let loose = LOOSE_CONTENT
        .captures(text)
        .and_then(|caps| first_group(&caps))
        .map(|content| unescape(&content).trim().to_string())
        .filter(|content| !content.is_empty())?;

    let reply_relay = LOOSE_RELAY
        .captures(text)
        .and_then(|caps| first_group(&caps))
        .map(|relay| relay.trim().to_string())
        .filter(|relay| !relay.is_empty());

    Some(TemplateEntry {
        content: loose,
        reply_relay,
    })
}
