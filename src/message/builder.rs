//! Message bundle construction.
//!
//! Every event type maps to a template pool. A template is drawn at random,
//! rendered once with protocol references (`nostr:npub…`, `nostr:nprofile…`)
//! and once with plain display names, and membership events get capacity or
//! displacement notices appended to both channels. Unknown event types yield
//! a JSON fallback so callers can detect them.

use rand::Rng;
use serde_json::json;

use super::bundle::MessageBundle;
use super::entities::{EntityCatalogue, EntitySelection};
use super::item::{DisplacementCandidate, EventType, MessageItem, RenderRequest};
use crate::config::default_promo_trailer;
use crate::metrics::RenderMetrics;
use crate::nostr::{encode_event_ref, encode_pubkey_ref, normalize_profile_ref, nostr_uri};
use crate::template::{render_or_raw, resolve_pool, RenderContext, TemplateEntry, TemplateOverrides};

/// Placeholder that triggers an entity draw
pub const ENTITY_PLACEHOLDER: &str = "{goat_name}";

const BOLT12_PREFIX: &str = "⚡BOLT12 PAYMENT⚡ ";
const DEFAULT_REQUIRED_SATS: i64 = 10;

/// Capacity notice for the given number of open spots
pub fn capacity_notice(spots_remaining: i64) -> Option<String> {
    match spots_remaining {
        n if n > 1 => Some(format!("⚡ {} more spots available. ⚡", n)),
        1 => Some("⚡ 1 more spot available. ⚡".to_string()),
        _ => None,
    }
}

/// Protocol reference for a member: npub, then profile token, then note reference.
///
/// `event_id` is only consulted when given; join messages may fall back to the
/// zap note when the member has no key material.
pub fn member_reference(
    pubkey: Option<&str>,
    nprofile: Option<&str>,
    event_id: Option<&str>,
) -> Option<String> {
    pubkey
        .and_then(encode_pubkey_ref)
        .map(|npub| nostr_uri(&npub))
        .or_else(|| normalize_profile_ref(nprofile))
        .or_else(|| {
            event_id
                .and_then(encode_event_ref)
                .map(|note| nostr_uri(&note))
        })
}

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().unwrap_or(fallback)
}

/// Attacker/victim names resolved for both channels
struct Rivals {
    attacker_ref: String,
    attacker_display: String,
    victim_ref: String,
    victim_display: String,
}

/// Renders event notifications into [`MessageBundle`]s
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    overrides: TemplateOverrides,
    catalogue: EntityCatalogue,
    promo_trailer: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            overrides: TemplateOverrides::new(),
            catalogue: EntityCatalogue::goats(),
            promo_trailer: default_promo_trailer(),
        }
    }

    pub fn with_overrides(mut self, overrides: TemplateOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_catalogue(mut self, catalogue: EntityCatalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    pub fn with_promo_trailer(mut self, trailer: impl Into<String>) -> Self {
        self.promo_trailer = trailer.into();
        self
    }

    pub fn overrides(&self) -> &TemplateOverrides {
        &self.overrides
    }

    pub fn catalogue(&self) -> &EntityCatalogue {
        &self.catalogue
    }

    pub fn promo_trailer(&self) -> &str {
        &self.promo_trailer
    }

    /// Remove the promotional trailer from protocol content of container replies
    pub fn strip_trailer(&self, content: &str, container_reply: bool) -> String {
        if container_reply && !self.promo_trailer.is_empty() {
            content.replace(&self.promo_trailer, "")
        } else {
            content.to_string()
        }
    }

    fn pick<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> TemplateEntry {
        resolve_pool(category, &self.overrides).pick(rng)
    }

    /// Render one bundle. Never fails; see the module docs for fallbacks.
    pub fn build<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        use EventType::*;

        let bundle = match &request.event_type {
            CyberHerd | NewMember => self.join(request, rng),
            FeederTriggered | FeederTriggerBolt12 | SatsReceived | SatsReceivedZap => {
                self.funding(request, rng)
            }
            HeadbuttInfo => self.displacement_info(request, rng),
            HeadbuttSuccess => self.displacement_success(request, rng),
            HeadbuttFailure => self.displacement_failure(request, rng),
            CyberHerdTreats => self.treats(request, rng),
            MemberIncrease => self.member_increase(request, rng),
            DailyReset | HerdResetMessage => self.plain(request, "daily_reset", rng),
            InterfaceInfo => self.plain(request, "interface_info", rng),
            Kind6Repost | Kind7Reaction => self.engagement_join(request, rng),
            Kind6HeadbuttFailure | Kind7HeadbuttFailure => self.engagement_failure(request, rng),
            ZapperDisplacesKind6 | ZapperDisplacesKind7 => self.zapper_displaces(request, rng),
            FeedingRegular | FeedingBonus | FeedingRemainder | FeedingFallback => {
                self.feeding(request, rng)
            }
            Unknown(name) => Self::fallback(name, &request.item),
        };

        let label = match &request.event_type {
            Unknown(_) => "unknown",
            known => known.as_str(),
        };
        RenderMetrics::record_bundle(label);
        bundle
    }

    fn fallback(event_type: &str, item: &MessageItem) -> MessageBundle {
        tracing::warn!(event_type = %event_type, "Unsupported event type, emitting JSON payload");
        RenderMetrics::record_fallback();
        let payload = json!({ "event": event_type, "payload": item });
        MessageBundle::uniform(payload.to_string())
    }

    /// Render both channels, append notices and strip the trailer where needed
    fn assemble(
        &self,
        request: &RenderRequest,
        template: &TemplateEntry,
        protocol: &RenderContext,
        display: &RenderContext,
        capacity_notice: Option<String>,
        displacement_notice: Option<String>,
    ) -> MessageBundle {
        let mut bundle = MessageBundle {
            capacity_notice,
            displacement_notice,
            spots_remaining: request.spots_remaining,
            reply_relay: template.reply_relay.clone(),
            ..Default::default()
        };
        let supplement = bundle.supplemental_text();

        let nostr_body = render_or_raw(&template.content, protocol);
        let display_body = render_or_raw(&template.content, display);

        bundle.nostr_content = self.strip_trailer(
            &format!("{}{}", nostr_body, supplement),
            request.reply.is_container_reply(),
        );
        bundle.display_content = format!("{}{}", display_body, supplement);
        bundle
    }

    fn displacement_notice<R: Rng + ?Sized>(
        &self,
        candidate: Option<&DisplacementCandidate>,
        rng: &mut R,
    ) -> Option<String> {
        let candidate = candidate?;
        let template = self.pick("headbutt_info", rng);
        let context = RenderContext::new()
            .with(
                "required_sats",
                candidate.required_sats.unwrap_or(DEFAULT_REQUIRED_SATS),
            )
            .with("victim_name", text_or(&candidate.victim_name, "Anon"));
        Some(render_or_raw(&template.content, &context))
    }

    /// Capacity notice plus, when the herd is full, the displacement notice
    fn membership_notices<R: Rng + ?Sized>(
        &self,
        request: &RenderRequest,
        rng: &mut R,
    ) -> (Option<String>, Option<String>) {
        let displacement = if request.spots_remaining == 0 {
            self.displacement_notice(request.item.headbutt_info.as_ref(), rng)
        } else {
            None
        };
        (capacity_notice(request.spots_remaining), displacement)
    }

    fn thanks_fragment<R: Rng + ?Sized>(&self, amount: i64, rng: &mut R) -> String {
        if amount == 0 {
            return String::new();
        }
        let template = self.pick("thank_you_variations", rng);
        render_or_raw(
            &template.content,
            &RenderContext::new().with("new_amount", amount),
        )
    }

    fn difference_message<R: Rng + ?Sized>(&self, difference: i64, rng: &mut R) -> String {
        let template = self.pick("variations", rng);
        render_or_raw(
            &template.content,
            &RenderContext::new().with("difference", difference),
        )
    }

    fn rivals(item: &MessageItem, attacker_event_ref: bool) -> Rivals {
        let attacker_name = text_or(&item.attacker_name, "Anon");
        let victim_name = text_or(&item.victim_name, "Anon");
        let event_id = if attacker_event_ref {
            item.event_id.as_deref()
        } else {
            None
        };

        Rivals {
            attacker_ref: member_reference(
                item.attacker_pubkey.as_deref(),
                item.attacker_nprofile.as_deref(),
                event_id,
            )
            .unwrap_or_else(|| attacker_name.to_string()),
            attacker_display: text_or(&item.attacker_display_name, attacker_name).to_string(),
            victim_ref: member_reference(
                item.victim_pubkey.as_deref(),
                item.victim_nprofile.as_deref(),
                None,
            )
            .unwrap_or_else(|| victim_name.to_string()),
            victim_display: text_or(&item.victim_display_name, victim_name).to_string(),
        }
    }

    fn join<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("cyber_herd_join", rng);
        let display_name = text_or(&item.display_name, "anon");
        let amount = item.amount.unwrap_or(0);
        let event_id = item.event_id.clone().unwrap_or_default();
        let reference = member_reference(
            item.pubkey.as_deref(),
            item.nprofile.as_deref(),
            Some(event_id.as_str()),
        )
        .unwrap_or_else(|| display_name.to_string());

        let (capacity, displacement) = self.membership_notices(request, rng);
        let shared = RenderContext::new()
            .with("thanks_part", self.thanks_fragment(amount, rng))
            .with("difference", request.difference)
            .with("new_amount", amount)
            .with("event_id", event_id);

        self.assemble(
            request,
            &template,
            &shared.clone().with("name", reference),
            &shared.with("name", display_name),
            capacity,
            displacement,
        )
    }

    fn funding<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let category = match request.event_type {
            EventType::SatsReceived | EventType::SatsReceivedZap => "sats_received",
            _ => "feeder_trigger",
        };
        let mut template = self.pick(category, rng);
        if request.event_type == EventType::FeederTriggerBolt12 {
            template.content = format!("{}{}", BOLT12_PREFIX, template.content);
        }

        let selection = if template.content.contains(ENTITY_PLACEHOLDER) {
            self.catalogue.select(rng)
        } else {
            EntitySelection::default()
        };

        let shared = RenderContext::new()
            .with("new_amount", request.new_amount)
            .with(
                "difference_message",
                self.difference_message(request.difference, rng),
            );

        let mut bundle = self.assemble(
            request,
            &template,
            &shared.clone().with("goat_name", &selection.references),
            &shared.with("goat_name", &selection.names),
            None,
            None,
        );
        if !selection.is_empty() {
            bundle.entities = Some(selection.images);
            bundle.entity_pubkeys = selection.pubkeys;
        }
        bundle
    }

    fn displacement_info<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("headbutt_info", rng);
        let victim_name = text_or(&item.victim_name, "Anon");
        let victim_display = text_or(&item.victim_display_name, victim_name);
        let victim_ref = member_reference(
            item.victim_pubkey.as_deref(),
            item.victim_nprofile.as_deref(),
            None,
        )
        .unwrap_or_else(|| victim_display.to_string());

        let shared = RenderContext::new().with("required_sats", item.required_sats.unwrap_or(0));
        self.assemble(
            request,
            &template,
            &shared.clone().with("victim_name", victim_ref),
            &shared.with("victim_name", victim_display),
            None,
            None,
        )
    }

    fn displacement_success<R: Rng + ?Sized>(
        &self,
        request: &RenderRequest,
        rng: &mut R,
    ) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("headbutt_success", rng);
        let rivals = Self::rivals(item, true);
        let next = self.displacement_notice(item.next_headbutt_info.as_ref(), rng);

        let shared = RenderContext::new()
            .with("attacker_amount", item.attacker_amount.unwrap_or(0))
            .with("victim_amount", item.victim_amount.unwrap_or(0));
        self.assemble(
            request,
            &template,
            &shared
                .clone()
                .with("attacker_name", rivals.attacker_ref)
                .with("victim_name", rivals.victim_ref),
            &shared
                .with("attacker_name", rivals.attacker_display)
                .with("victim_name", rivals.victim_display),
            None,
            next,
        )
    }

    fn displacement_failure<R: Rng + ?Sized>(
        &self,
        request: &RenderRequest,
        rng: &mut R,
    ) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("headbutt_failure", rng);
        let rivals = Self::rivals(item, false);

        let shared = RenderContext::new()
            .with("attacker_amount", item.attacker_amount.unwrap_or(0))
            .with("victim_amount", item.victim_amount.unwrap_or(0))
            .with("required_amount", item.required_amount.unwrap_or(0))
            .with(
                "required_sats",
                item.required_sats.or(item.required_amount).unwrap_or(0),
            );
        self.assemble(
            request,
            &template,
            &shared
                .clone()
                .with("attacker_name", rivals.attacker_ref)
                .with("victim_name", rivals.victim_ref),
            &shared
                .with("attacker_name", rivals.attacker_display)
                .with("victim_name", rivals.victim_display),
            None,
            None,
        )
    }

    fn treats<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("cyber_herd_treats", rng);
        let display_name = text_or(&item.display_name, "Anon");
        let reference = member_reference(item.pubkey.as_deref(), item.nprofile.as_deref(), None)
            .unwrap_or_else(|| display_name.to_string());

        let shared = RenderContext::new().with("new_amount", item.amount.unwrap_or(0));
        self.assemble(
            request,
            &template,
            &shared.clone().with("name", reference),
            &shared.with("name", display_name),
            None,
            None,
        )
    }

    fn member_increase<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick("member_increase", rng);
        let display_name = text_or(&item.display_name, "Anon");
        let reference = member_reference(item.pubkey.as_deref(), item.nprofile.as_deref(), None)
            .unwrap_or_else(|| display_name.to_string());

        let (capacity, displacement) = self.membership_notices(request, rng);
        let shared = RenderContext::new()
            .with("increase_amount", item.new_zap_amount.unwrap_or(0))
            .with("new_total", item.amount.unwrap_or(0));
        self.assemble(
            request,
            &template,
            &shared.clone().with("member_name", reference),
            &shared.with("member_name", display_name),
            capacity,
            displacement,
        )
    }

    fn plain<R: Rng + ?Sized>(&self, request: &RenderRequest, category: &str, rng: &mut R) -> MessageBundle {
        let template = self.pick(category, rng);
        let empty = RenderContext::new();
        self.assemble(request, &template, &empty, &empty, None, None)
    }

    fn engagement_join<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick(request.event_type.as_str(), rng);
        let display_name = text_or(&item.display_name, "Anon");
        let reference = member_reference(item.pubkey.as_deref(), item.nprofile.as_deref(), None)
            .unwrap_or_else(|| display_name.to_string());

        let (capacity, displacement) = self.membership_notices(request, rng);
        self.assemble(
            request,
            &template,
            &RenderContext::new().with("name", reference),
            &RenderContext::new().with("name", display_name),
            capacity,
            displacement,
        )
    }

    fn engagement_failure<R: Rng + ?Sized>(
        &self,
        request: &RenderRequest,
        rng: &mut R,
    ) -> MessageBundle {
        let item = &request.item;
        let template = self.pick(request.event_type.as_str(), rng);
        let display_name = text_or(&item.display_name, "Anon");
        let reference = member_reference(item.pubkey.as_deref(), item.nprofile.as_deref(), None)
            .unwrap_or_else(|| display_name.to_string());
        let victim_display = item
            .victim_display_name
            .as_deref()
            .or(item.victim_name.as_deref())
            .unwrap_or("Anon");
        let victim_ref = member_reference(
            item.victim_pubkey.as_deref(),
            item.victim_nprofile.as_deref(),
            None,
        )
        .unwrap_or_else(|| victim_display.to_string());

        let shared = RenderContext::new().with(
            "required_sats",
            item.required_sats.or(item.required_amount).unwrap_or(0),
        );
        self.assemble(
            request,
            &template,
            &shared
                .clone()
                .with("name", reference)
                .with("victim_name", victim_ref),
            &shared
                .with("name", display_name)
                .with("victim_name", victim_display),
            None,
            None,
        )
    }

    fn zapper_displaces<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let item = &request.item;
        let template = self.pick(request.event_type.as_str(), rng);
        let attacker_display = item
            .attacker_display_name
            .as_deref()
            .or(item.attacker_name.as_deref())
            .unwrap_or("Anon");
        let victim_display = item
            .victim_display_name
            .as_deref()
            .or(item.victim_name.as_deref())
            .unwrap_or("Anon");
        let attacker_ref = member_reference(
            item.attacker_pubkey.as_deref(),
            item.attacker_nprofile.as_deref(),
            None,
        )
        .unwrap_or_else(|| attacker_display.to_string());
        let victim_ref = member_reference(
            item.victim_pubkey.as_deref(),
            item.victim_nprofile.as_deref(),
            None,
        )
        .unwrap_or_else(|| victim_display.to_string());

        let (capacity, displacement) = self.membership_notices(request, rng);
        let shared = RenderContext::new().with("attacker_amount", item.attacker_amount.unwrap_or(0));
        self.assemble(
            request,
            &template,
            &shared
                .clone()
                .with("attacker_name", attacker_ref)
                .with("victim_name", victim_ref),
            &shared
                .with("attacker_name", attacker_display)
                .with("victim_name", victim_display),
            capacity,
            displacement,
        )
    }

    fn feeding<R: Rng + ?Sized>(&self, request: &RenderRequest, rng: &mut R) -> MessageBundle {
        let template = self.pick(request.event_type.as_str(), rng);
        let display_name = text_or(&request.item.display_name, "member");
        let context = RenderContext::new()
            .with("new_amount", request.new_amount)
            .with("display_name", display_name)
            .with("name", display_name);
        self.assemble(request, &template, &context, &context, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::item::ReplyContext;
    use crate::template::TemplatePool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    const MEMBER_HEX: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const MEMBER_NPUB: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";
    const TRAILER: &str = "\n\n https://lightning-goats.com\n\n";

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn single(category: &str, content: &str) -> TemplateOverrides {
        let mut pool = TemplatePool::new();
        pool.insert("0", TemplateEntry::new(content));
        let mut overrides = TemplateOverrides::new();
        overrides.insert(category.to_string(), pool);
        overrides
    }

    fn builder_with(category: &str, content: &str) -> MessageBuilder {
        MessageBuilder::new().with_overrides(single(category, content))
    }

    #[test]
    fn test_capacity_notice() {
        assert_eq!(
            capacity_notice(3).as_deref(),
            Some("⚡ 3 more spots available. ⚡")
        );
        assert_eq!(
            capacity_notice(1).as_deref(),
            Some("⚡ 1 more spot available. ⚡")
        );
        assert_eq!(capacity_notice(0), None);
        assert_eq!(capacity_notice(-1), None);
    }

    #[test]
    fn test_member_reference_priority() {
        assert_eq!(
            member_reference(Some(MEMBER_HEX), Some("nprofile1abc"), None),
            Some(format!("nostr:{}", MEMBER_NPUB))
        );
        assert_eq!(
            member_reference(Some("short"), Some("nprofile1abc"), None),
            Some("nostr:nprofile1abc".to_string())
        );
        assert!(member_reference(None, None, Some(MEMBER_HEX))
            .unwrap()
            .starts_with("nostr:note1"));
        assert_eq!(member_reference(None, Some("  "), Some("nope")), None);
    }

    #[test]
    fn test_join_with_capacity() {
        let builder = builder_with("cyber_herd_join", "Welcome {name}!");
        let request = RenderRequest::new("cyber_herd")
            .with_item(MessageItem {
                display_name: Some("Alice".to_string()),
                pubkey: Some(MEMBER_HEX.to_string()),
                ..Default::default()
            })
            .with_spots_remaining(3);

        let bundle = builder.build(&request, &mut rng());
        assert_eq!(
            bundle.nostr_content,
            format!("Welcome nostr:{}!⚡ 3 more spots available. ⚡", MEMBER_NPUB)
        );
        assert_eq!(
            bundle.display_content,
            "Welcome Alice!⚡ 3 more spots available. ⚡"
        );
        assert_eq!(bundle.spots_remaining, 3);
        assert!(bundle.displacement_notice.is_none());
    }

    #[test]
    fn test_join_full_herd_adds_displacement_notice() {
        let mut overrides = single("cyber_herd_join", "Welcome {name}.");
        overrides.extend(single(
            "headbutt_info",
            "Need {required_sats} sats to displace {victim_name}.",
        ));
        let builder = MessageBuilder::new().with_overrides(overrides);
        let request = RenderRequest::new(EventType::NewMember).with_item(MessageItem {
            display_name: Some("Alice".to_string()),
            headbutt_info: Some(DisplacementCandidate {
                required_sats: Some(50),
                victim_name: Some("Bob".to_string()),
            }),
            ..Default::default()
        });

        let bundle = builder.build(&request, &mut rng());
        assert_eq!(
            bundle.display_content,
            "Welcome Alice. Need 50 sats to displace Bob."
        );
        assert_eq!(
            bundle.displacement_notice.as_deref(),
            Some("Need 50 sats to displace Bob.")
        );
        assert!(bundle.capacity_notice.is_none());
    }

    #[test]
    fn test_displacement_defaults() {
        let builder = builder_with("headbutt_info", "{required_sats}/{victim_name}");
        let notice = builder.displacement_notice(Some(&DisplacementCandidate::default()), &mut rng());
        assert_eq!(notice.as_deref(), Some("10/Anon"));
    }

    #[test]
    fn test_join_thanks_fragment_only_for_non_zero_amount() {
        let mut overrides = single("cyber_herd_join", "[{thanks_part}]");
        overrides.extend(single("thank_you_variations", "Thanks for {new_amount}."));
        let builder = MessageBuilder::new().with_overrides(overrides);

        let zero = builder.build(&RenderRequest::new("cyber_herd").with_spots_remaining(-1), &mut rng());
        assert_eq!(zero.display_content, "[]");

        let paid = RenderRequest::new("cyber_herd")
            .with_item(MessageItem {
                amount: Some(21),
                ..Default::default()
            })
            .with_spots_remaining(-1);
        assert_eq!(builder.build(&paid, &mut rng()).display_content, "[Thanks for 21.]");
    }

    #[test]
    fn test_container_reply_strips_trailer_from_protocol_only() {
        let builder = builder_with("cyber_herd_join", &format!("Hi {{name}}{}", TRAILER));
        let request = RenderRequest::new("cyber_herd")
            .with_item(MessageItem {
                display_name: Some("Alice".to_string()),
                ..Default::default()
            })
            .with_spots_remaining(2)
            .with_reply(ReplyContext::container("ab".repeat(32), "30311:pk:live"));

        let bundle = builder.build(&request, &mut rng());
        assert!(!bundle.nostr_content.contains("lightning-goats.com"));
        assert!(bundle.display_content.contains("lightning-goats.com"));
        assert_eq!(bundle.nostr_content, "Hi Alice⚡ 2 more spots available. ⚡");
    }

    #[test]
    fn test_funding_with_entities() {
        let mut overrides = single("feeder_trigger", "{new_amount} sats fed {goat_name}. {difference_message}");
        overrides.extend(single("variations", "{difference} to go."));
        let builder = MessageBuilder::new().with_overrides(overrides);
        let request = RenderRequest::new(EventType::FeederTriggered).with_amounts(1000, 250);

        let bundle = builder.build(&request, &mut rng());
        let entities = bundle.entities.clone().unwrap();
        assert!(!entities.is_empty());
        assert_eq!(bundle.entity_pubkeys.len(), entities.len());
        assert!(bundle.nostr_content.contains("nostr:nprofile1"));
        assert!(!bundle.nostr_content.contains("p-tag"));
        assert!(bundle.display_content.starts_with("1000 sats fed "));
        assert!(bundle.display_content.ends_with("250 to go."));
        for entity in &entities {
            assert!(bundle.display_content.contains(&entity.name));
        }
    }

    #[test]
    fn test_funding_without_placeholder_has_no_entities() {
        let builder = builder_with("sats_received", "Got {new_amount} sats.");
        let bundle = builder.build(
            &RenderRequest::new(EventType::SatsReceivedZap).with_amounts(21, 0),
            &mut rng(),
        );
        assert_eq!(bundle.nostr_content, "Got 21 sats.");
        assert_eq!(bundle.display_content, bundle.nostr_content);
        assert!(bundle.entities.is_none());
    }

    #[test]
    fn test_bolt12_prefix_on_both_channels() {
        let builder = builder_with("feeder_trigger", "Fed with {new_amount}.");
        let bundle = builder.build(
            &RenderRequest::new("feeder_trigger_bolt12").with_amounts(500, 0),
            &mut rng(),
        );
        assert_eq!(bundle.nostr_content, "⚡BOLT12 PAYMENT⚡ Fed with 500.");
        assert_eq!(bundle.display_content, "⚡BOLT12 PAYMENT⚡ Fed with 500.");
    }

    #[test]
    fn test_headbutt_success_with_next_notice() {
        let mut overrides = single(
            "headbutt_success",
            "{attacker_name} ({attacker_amount}) beat {victim_name} ({victim_amount}).",
        );
        overrides.extend(single("headbutt_info", "Next: {victim_name} at {required_sats}."));
        let builder = MessageBuilder::new().with_overrides(overrides);
        let request = RenderRequest::new("headbutt_success").with_item(MessageItem {
            attacker_name: Some("carol".to_string()),
            attacker_display_name: Some("Carol".to_string()),
            attacker_pubkey: Some(MEMBER_HEX.to_string()),
            attacker_amount: Some(500),
            victim_name: Some("Dan".to_string()),
            victim_amount: Some(100),
            next_headbutt_info: Some(DisplacementCandidate {
                required_sats: Some(120),
                victim_name: Some("Eve".to_string()),
            }),
            ..Default::default()
        });

        let bundle = builder.build(&request, &mut rng());
        assert_eq!(
            bundle.display_content,
            "Carol (500) beat Dan (100). Next: Eve at 120."
        );
        assert!(bundle
            .nostr_content
            .starts_with(&format!("nostr:{} (500) beat Dan (100).", MEMBER_NPUB)));
    }

    #[test]
    fn test_member_increase() {
        let builder = builder_with(
            "member_increase",
            "{member_name} +{increase_amount} = {new_total}",
        );
        let request = RenderRequest::new("member_increase")
            .with_item(MessageItem::from_value(&json!({
                "display_name": "Alice",
                "amount": 300,
                "new_zap_amount": "100"
            })))
            .with_spots_remaining(1);

        let bundle = builder.build(&request, &mut rng());
        assert_eq!(
            bundle.display_content,
            "Alice +100 = 300⚡ 1 more spot available. ⚡"
        );
    }

    #[test]
    fn test_feeding_uses_member_default() {
        let builder = builder_with("feeding_bonus", "{display_name} got {new_amount}");
        let bundle = builder.build(
            &RenderRequest::new("feeding_bonus").with_amounts(42, 0),
            &mut rng(),
        );
        assert_eq!(bundle.nostr_content, "member got 42");
        assert_eq!(bundle.display_content, "member got 42");
    }

    #[test]
    fn test_daily_reset_and_herd_reset_share_pool() {
        let builder = builder_with("daily_reset", "Reset {{done}}");
        for event in ["daily_reset", "herd_reset_message"] {
            let bundle = builder.build(&RenderRequest::new(event), &mut rng());
            assert_eq!(bundle.nostr_content, "Reset {done}");
        }
    }

    #[test]
    fn test_unknown_event_falls_back_to_json() {
        let builder = MessageBuilder::new();
        let request = RenderRequest::new("mystery_event").with_item(MessageItem {
            display_name: Some("Alice".to_string()),
            ..Default::default()
        });

        let bundle = builder.build(&request, &mut rng());
        let parsed: serde_json::Value = serde_json::from_str(&bundle.nostr_content).unwrap();
        assert_eq!(parsed["event"], "mystery_event");
        assert_eq!(parsed["payload"]["display_name"], "Alice");
        assert_eq!(bundle.display_content, bundle.nostr_content);
    }

    #[test]
    fn test_unsafe_placeholder_renders_raw_template() {
        let builder = builder_with("cyber_herd_treats", "{name.__class__} got {new_amount}");
        let bundle = builder.build(&RenderRequest::new("cyber_herd_treats"), &mut rng());
        assert_eq!(bundle.nostr_content, "{name.__class__} got {new_amount}");
    }

    fn populated_item() -> MessageItem {
        let candidate = DisplacementCandidate {
            required_sats: Some(250),
            victim_name: Some("Carol".to_string()),
        };
        MessageItem {
            display_name: Some("Alice".to_string()),
            amount: Some(500),
            new_zap_amount: Some(21),
            required_amount: Some(101),
            attacker_name: Some("Bob".to_string()),
            attacker_amount: Some(600),
            victim_name: Some("Dan".to_string()),
            victim_amount: Some(400),
            headbutt_info: Some(candidate.clone()),
            next_headbutt_info: Some(candidate),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_known_event_renders_from_defaults() {
        let builder = MessageBuilder::new();
        let placeholder = regex::Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap();
        let events = [
            "cyber_herd", "new_member", "member_increase", "feeder_triggered",
            "feeder_trigger_bolt12", "sats_received", "sats_received_zap", "headbutt_info",
            "headbutt_success", "headbutt_failure", "cyber_herd_treats", "daily_reset",
            "herd_reset_message", "interface_info", "kind_6_repost", "kind_7_reaction",
            "kind_6_headbutt_failure", "kind_7_headbutt_failure", "zapper_displaces_kind_6",
            "zapper_displaces_kind_7", "feeding_regular", "feeding_bonus",
            "feeding_remainder", "feeding_fallback",
        ];

        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            for event in events {
                for spots_remaining in [0, 3] {
                    let request = RenderRequest::new(event)
                        .with_amounts(100, 50)
                        .with_item(populated_item())
                        .with_spots_remaining(spots_remaining);
                    let bundle = builder.build(&request, &mut rng);

                    assert!(!bundle.nostr_content.is_empty(), "{} rendered empty", event);
                    assert!(
                        !bundle.nostr_content.starts_with("{\"event\""),
                        "{} fell back to JSON",
                        event
                    );
                    for content in [&bundle.nostr_content, &bundle.display_content] {
                        assert!(
                            !placeholder.is_match(content),
                            "{} left a placeholder (seed {}): {}",
                            event,
                            seed,
                            content
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_displacement_failure_fills_required_sats() {
        let builder = builder_with(
            "headbutt_failure",
            "{required_sats} sats needed to replace {victim_name}.",
        );
        let request = RenderRequest::new("headbutt_failure").with_item(MessageItem {
            victim_name: Some("Dan".to_string()),
            required_amount: Some(101),
            ..Default::default()
        });
        let bundle = builder.build(&request, &mut rng());
        assert_eq!(bundle.nostr_content, "101 sats needed to replace Dan.");

        let explicit = RenderRequest::new("headbutt_failure").with_item(MessageItem {
            victim_name: Some("Dan".to_string()),
            required_sats: Some(77),
            required_amount: Some(101),
            ..Default::default()
        });
        let bundle = builder.build(&explicit, &mut rng());
        assert_eq!(bundle.nostr_content, "77 sats needed to replace Dan.");
    }

    #[test]
    fn test_unknown_event_types_share_one_metric_label() {
        use crate::metrics::BUNDLES_RENDERED_TOTAL;

        let builder = MessageBuilder::new();
        let before = BUNDLES_RENDERED_TOTAL.with_label_values(&["unknown"]).get();
        builder.build(&RenderRequest::new("caller_chosen_zx81"), &mut rng());

        assert!(BUNDLES_RENDERED_TOTAL.with_label_values(&["unknown"]).get() > before);
        let encoded = crate::metrics::encode_metrics().unwrap();
        assert!(!encoded.contains("caller_chosen_zx81"));
    }

    #[test]
    fn test_channels_identical_without_references() {
        let builder = MessageBuilder::new();
        let mut rng = rng();
        for _ in 0..20 {
            let request = RenderRequest::new("cyber_herd_treats").with_item(MessageItem {
                display_name: Some("Alice".to_string()),
                amount: Some(10),
                ..Default::default()
            });
            let bundle = builder.build(&request, &mut rng);
            assert_eq!(bundle.nostr_content, bundle.display_content);
        }
    }
}
