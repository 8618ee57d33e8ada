//! NIP-10 reference tag composition.
//!
//! Output order: caller-supplied tags, event references (`root`, `reply`,
//! `mention`), validated pubkey references, then the live container (`a`)
//! reference. Duplicate tuples are dropped, first occurrence wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::codec::is_valid_hex_id;
use super::relay::normalize_relay_hint;

/// Address prefix of live activity events (kind 30311)
pub const LIVE_EVENT_PREFIX: &str = "30311:";

/// A single protocol tag, serialized as a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// `["e", id, relay, marker]`
    pub fn event(id: &str, relay: &str, marker: &str) -> Self {
        Self::new(["e", id, relay, marker])
    }

    /// `["p", pubkey]`
    pub fn pubkey(pubkey: &str) -> Self {
        Self::new(["p", pubkey])
    }

    /// `["a", "kind:pubkey:identifier"]`
    pub fn address(coordinate: &str) -> Self {
        Self::new(["a", coordinate])
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn marker(&self) -> Option<&str> {
        self.0.get(3).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for an `a` tag pointing at a live activity event
    pub fn is_live_container(&self) -> bool {
        self.kind() == Some("a")
            && self
                .value()
                .is_some_and(|value| value.starts_with(LIVE_EVENT_PREFIX))
    }
}

/// Inputs for one tag composition
#[derive(Debug, Clone, Default)]
pub struct TagRequest {
    /// Tags passed through verbatim, ahead of everything else
    pub explicit_tags: Vec<Tag>,
    /// Event ids to reference, in thread order
    pub event_ids: Vec<String>,
    /// Pubkeys to mention; invalid entries are dropped
    pub pubkeys: Vec<String>,
    /// Live container event being replied to
    pub container_event_id: Option<String>,
    /// Live container coordinate (`30311:<pubkey>:<identifier>`)
    pub container_ref: Option<String>,
    /// Raw relay hint for root/reply tags
    pub relay_hint: Option<String>,
}

impl TagRequest {
    pub fn is_container_reply(&self) -> bool {
        has_text(self.container_event_id.as_deref()) && has_text(self.container_ref.as_deref())
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

struct TagSet {
    tags: Vec<Tag>,
    seen: HashSet<Tag>,
}

impl TagSet {
    fn new() -> Self {
        Self {
            tags: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, tag: Tag) {
        if tag.is_empty() || self.seen.contains(&tag) {
            return;
        }
        self.seen.insert(tag.clone());
        self.tags.push(tag);
    }
}

fn push_unique(target: &mut Vec<String>, candidate: &str) {
    let value = candidate.trim();
    if value.is_empty() || target.iter().any(|existing| existing == value) {
        return;
    }
    target.push(value.to_string());
}

/// Build the ordered, deduplicated tag list for a note.
///
/// One event id yields a single `root` tag. With two or more, the first is
/// `root`, the second `reply` and the rest `mention` (without relay hint).
pub fn compose_tags(request: &TagRequest) -> Vec<Tag> {
    let mut set = TagSet::new();

    for tag in &request.explicit_tags {
        set.push(tag.clone());
    }

    let mut event_ids: Vec<String> = Vec::new();
    for id in &request.event_ids {
        push_unique(&mut event_ids, id);
    }
    if let Some(container_event) = request.container_event_id.as_deref() {
        push_unique(&mut event_ids, container_event);
    }

    let relay = request
        .relay_hint
        .as_deref()
        .and_then(normalize_relay_hint)
        .unwrap_or_default();

    for (position, id) in event_ids.iter().enumerate() {
        match position {
            0 => set.push(Tag::event(id, &relay, "root")),
            1 => set.push(Tag::event(id, &relay, "reply")),
            _ => set.push(Tag::event(id, "", "mention")),
        }
    }

    let mut pubkeys: Vec<String> = Vec::new();
    for pubkey in &request.pubkeys {
        push_unique(&mut pubkeys, pubkey);
    }
    for pubkey in pubkeys {
        if is_valid_hex_id(&pubkey) {
            set.push(Tag::pubkey(&pubkey.to_ascii_lowercase()));
        } else {
            let preview: String = pubkey.chars().take(20).collect();
            tracing::debug!(pubkey = %preview, "Dropping invalid pubkey from mention tags");
        }
    }

    if let Some(coordinate) = request.container_ref.as_deref() {
        let coordinate = coordinate.trim();
        if !coordinate.is_empty() {
            set.push(Tag::address(coordinate));
        }
    }

    set.tags
}
