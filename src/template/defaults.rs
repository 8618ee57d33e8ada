//! Built-in template pools.
//!
//! Each pool maps a variant key to a body and an optional relay hint.
//! Stored templates override these per category.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::pool::TemplatePool;
use super::types::TemplateEntry;

type Variant = (&'static str, &'static str, Option<&'static str>);

const CYBER_HERD_JOIN: &[Variant] = &[
    ("0", "{name} has joined the ⚡ CyberHerd ⚡. {thanks_part} The feeder will activate in {difference} sats.\n\n https://lightning-goats.com\n\n", Some("https://relay.damus.io")),
    ("1", "Welcome, {name}. {thanks_part} The ⚡ CyberHerd ⚡ grows. {difference} sats are required for the next feeding cycle.\n\n https://lightning-goats.com\n\n", Some("https://nostr-pub.wellorder.net")),
];

const THANK_YOU_VARIATIONS: &[Variant] = &[
    ("0", "Thank you for the contribution of {new_amount} sats.", Some("https://relay.snort.social")),
    ("1", "Your {new_amount} sat contribution has been received and supports the herd.", Some("https://relay.snort.social")),
];

const VARIATIONS: &[Variant] = &[
    ("0", "{difference} sats are required for feeder activation.", None),
    ("1", "The next feeding cycle will begin in {difference} sats.", None),
    ("2", "Awaiting a remaining {difference} sats to trigger the feeder.", None),
    ("3", "{difference} sats needed before the goats receive their treats.", None),
    ("4", "The feeder is {difference} sats away from activation.", None),
    ("5", "The feeding protocol will initiate after {difference} more sats.", None),
    ("6", "The system requires an additional {difference} sats to dispense treats.", None),
    ("7", "The feeder activation is pending {difference} more sats.", None),
    ("8", "{difference} sats remaining until the next scheduled feeding.", None),
    ("9", "Please note: {difference} more sats are needed for the next feeding.", None),
    ("10", "The feeder will dispense treats once {difference} more sats are contributed.", None),
];

const CYBER_HERD_TREATS: &[Variant] = &[
    ("0", "{name} has received a reward of {new_amount} sats from the ⚡ CyberHerd ⚡ distribution.\n\n https://lightning-goats.com\n\n", None),
    ("1", "A distribution of {new_amount} sats has been sent to {name} as part of their ⚡ CyberHerd ⚡ membership.\n\n https://lightning-goats.com\n\n", None),
];

const HEADBUTT_SUCCESS: &[Variant] = &[
    ("0", "⚡headbutt⚡: A new member has joined the ⚡ CyberHerd ⚡. {attacker_name} ({attacker_amount} sats) has displaced {victim_name} ({victim_amount} sats).\n\n https://lightning-goats.com\n\n", Some("https://relay.damus.io")),
    ("1", "⚡headbutt⚡: The ⚡ CyberHerd ⚡ roster has been updated. {attacker_name} ({attacker_amount} sats) has taken the position previously held by {victim_name} ({victim_amount} sats).\n\n https://lightning-goats.com\n\n", Some("https://relay.damus.io")),
    ("2", "⚡headbutt⚡: Membership change: {attacker_name} has entered the ⚡ CyberHerd ⚡ with a contribution of {attacker_amount} sats, displacing {victim_name} ({victim_amount} sats).\n\n https://lightning-goats.com\n\n", Some("https://nostr-pub.wellorder.net")),
    ("3", "⚡headbutt⚡: A position in the ⚡ CyberHerd ⚡ has been filled by {attacker_name} ({attacker_amount} sats). The previous member, {victim_name} ({victim_amount} sats), has been removed.\n\n https://lightning-goats.com\n\n", Some("https://nostr-pub.wellorder.net")),
    ("4", "⚡headbutt⚡: Update: {attacker_name} is now a member of the ⚡ CyberHerd ⚡ with a {attacker_amount} sat contribution, replacing {victim_name} ({victim_amount} sats).\n\n https://lightning-goats.com\n\n", Some("https://relay.snort.social")),
];

const HEADBUTT_FAILURE: &[Variant] = &[
    ("0", "⚡headbutt⚡: The ⚡ CyberHerd ⚡ is currently at full capacity. To join, a contribution of {required_sats} sats is needed to displace the member with the lowest contribution, {victim_name}.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡headbutt⚡: The ⚡ CyberHerd ⚡ is at capacity. A contribution greater than {required_sats} sats will grant you {victim_name}'s position.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡headbutt⚡: The ⚡ CyberHerd ⚡ is full. To become a member, you must contribute more than the lowest member's amount of {required_sats} sats, currently held by {victim_name}.\n\n https://lightning-goats.com\n\n", None),
    ("3", "⚡headbutt⚡: Membership in the ⚡ CyberHerd ⚡ is currently full. You can gain a spot by contributing at least {required_sats} sats, which will displace {victim_name}.\n\n https://lightning-goats.com\n\n", None),
    ("4", "⚡headbutt⚡: There are no available spots in the ⚡ CyberHerd ⚡. A contribution of {required_sats} sats or more is required to take the place of {victim_name}.\n\n https://lightning-goats.com\n\n", None),
];

const HEADBUTT_INFO: &[Variant] = &[
    ("0", "⚡headbutt⚡: The ⚡ CyberHerd ⚡ is currently at full capacity. To join, a contribution of {required_sats} sats is needed to displace the member with the lowest contribution, {victim_name}.\n\n https://lightning-goats.com\n\n", None),
];

const MEMBER_INCREASE: &[Variant] = &[
    ("0", "{member_name} increased their contribution by {increase_amount} sats, bringing their total to {new_total} sats.\n\n https://lightning-goats.com\n\n", None),
    ("1", "{member_name} has boosted their ⚡ CyberHerd ⚡ contribution by {increase_amount} sats, now totaling {new_total} sats.\n\n https://lightning-goats.com\n\n", None),
    ("2", "Contribution update: {member_name} added {increase_amount} sats to their total of {new_total} sats in the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
    ("3", "{member_name} has increased their stake in the ⚡ CyberHerd ⚡ by {increase_amount} sats, reaching a total of {new_total} sats.\n\n https://lightning-goats.com\n\n", None),
    ("4", "⚡ CyberHerd ⚡ update: {member_name} has grown their contribution by {increase_amount} sats, now at {new_total} sats total.\n\n https://lightning-goats.com\n\n", None),
];

const DAILY_RESET: &[Variant] = &[
    ("0", "🔄 Daily CyberHerd reset completed. All member contributions have been reset to zero. New feeding cycle begins now!\n\n https://lightning-goats.com\n\n", None),
    ("1", "🌅 Good morning! The CyberHerd has been reset for a new day. All contributions cleared and ready for fresh participation.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡ System reset: Daily CyberHerd cycle has begun. Previous contributions have been cleared. Welcome to participate!\n\n https://lightning-goats.com\n\n", None),
    ("3", "🔄 CyberHerd daily reset executed. All member balances reset to zero. Time to start contributing again!\n\n https://lightning-goats.com\n\n", None),
    ("4", "🌟 New day, new opportunities! CyberHerd has been reset and is ready for fresh contributions.\n\n https://lightning-goats.com\n\n", None),
];

const FEEDER_TRIGGER: &[Variant] = &[
    ("0", "🎉 Feeder activated! {new_amount} sats have triggered the feeding mechanism. {difference_message} Scientific fact: Goats, such as {goat_name}, have uniquely shaped rectangular pupils, which provide them a wide field of vision, aiding in predator detection.\n\n https://lightning-goats.com\n\n", Some("https://relay.damus.io")),
    ("1", "⚡ Feeder trigger reached! {new_amount} sats collected - dispensing treats to CyberHerd members. {difference_message} Fun fact: {goat_name} and other goats are incredibly agile climbers, capable of scaling steep terrain with ease.\n\n https://lightning-goats.com\n\n", Some("https://relay.snort.social")),
    ("2", "🎊 Feeding time! The CyberHerd has collected {new_amount} sats and the feeder has been activated. {difference_message} Did you know? {goat_name} represents the curious and intelligent nature of goats in general.\n\n https://lightning-goats.com\n\n", Some("https://nostr-pub.wellorder.net")),
    ("3", "🚀 Feeder activated with {new_amount} sats! CyberHerd members will receive their earned rewards. {difference_message} Interesting: Goats like {goat_name} have excellent memories and can recognize other goats and humans for years.\n\n https://lightning-goats.com\n\n", Some("https://nostr-pub.wellorder.net")),
    ("4", "⚡ CyberHerd feeding initiated! {new_amount} sats collected - treats being distributed now. {difference_message} Goat trivia: {goat_name} exemplifies how goats use their prehensile tongues to be selective eaters, often choosing the most nutritious parts of a plant.\n\n https://lightning-goats.com\n\n", Some("https://relay.snort.social")),
];

const FEEDING_REGULAR: &[Variant] = &[
    ("0", "{display_name} received {new_amount} sats from CyberHerd distribution.\n\n https://lightning-goats.com\n\n", None),
    ("1", "Regular feeding: {display_name} has been credited with {new_amount} sats.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡ CyberHerd payout: {new_amount} sats sent to {display_name}.\n\n https://lightning-goats.com\n\n", None),
    ("3", "Distribution complete: {display_name} received {new_amount} sats from the herd.\n\n https://lightning-goats.com\n\n", None),
    ("4", "Feeding reward: {new_amount} sats delivered to {display_name}.\n\n https://lightning-goats.com\n\n", None),
];

const FEEDING_BONUS: &[Variant] = &[
    ("0", "🎁 Bonus feeding! {display_name} received {new_amount} sats as a special reward.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡ Special bonus: {display_name} has been credited with {new_amount} sats.\n\n https://lightning-goats.com\n\n", None),
    ("2", "🎊 Bonus distribution: {new_amount} sats sent to {display_name}.\n\n https://lightning-goats.com\n\n", None),
    ("3", "Extra reward: {display_name} received {new_amount} sats bonus from CyberHerd.\n\n https://lightning-goats.com\n\n", None),
    ("4", "🎉 Special feeding: {new_amount} sats bonus delivered to {display_name}.\n\n https://lightning-goats.com\n\n", None),
];

const FEEDING_REMAINDER: &[Variant] = &[
    ("0", "📦 Remainder distribution: {display_name} received {new_amount} sats from remaining funds.\n\n https://lightning-goats.com\n\n", None),
    ("1", "Final payout: {display_name} has been credited with {new_amount} sats remainder.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡ Remainder funds: {new_amount} sats sent to {display_name}.\n\n https://lightning-goats.com\n\n", None),
    ("3", "Leftover distribution: {display_name} received {new_amount} sats from remainder.\n\n https://lightning-goats.com\n\n", None),
    ("4", "Final distribution: {new_amount} sats remainder delivered to {display_name}.\n\n https://lightning-goats.com\n\n", None),
];

const FEEDING_FALLBACK: &[Variant] = &[
    ("0", "🔄 Fallback distribution: {display_name} received {new_amount} sats via predefined wallet.\n\n https://lightning-goats.com\n\n", None),
    ("1", "System fallback: {display_name} has been credited with {new_amount} sats.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡ Fallback payout: {new_amount} sats sent to {display_name}.\n\n https://lightning-goats.com\n\n", None),
    ("3", "Predefined distribution: {display_name} received {new_amount} sats fallback.\n\n https://lightning-goats.com\n\n", None),
    ("4", "System distribution: {new_amount} sats fallback delivered to {display_name}.\n\n https://lightning-goats.com\n\n", None),
];

const INTERFACE_INFO: &[Variant] = &[
    ("0", "🔧 System interface information: All systems operational. CyberHerd ready for contributions.\n\n https://lightning-goats.com\n\n", None),
    ("1", "ℹ️ Interface status: CyberHerd system is online and accepting payments.\n\n https://lightning-goats.com\n\n", None),
    ("2", "⚡ System check: All CyberHerd interfaces functioning normally.\n\n https://lightning-goats.com\n\n", None),
    ("3", "🔄 Status update: CyberHerd interface is active and ready.\n\n https://lightning-goats.com\n\n", None),
    ("4", "📊 System info: CyberHerd operational with all interfaces online.\n\n https://lightning-goats.com\n\n", None),
];

const SATS_RECEIVED: &[Variant] = &[
    ("0", "💰 Payment received: {new_amount} sats added to CyberHerd. {difference_message} Scientific fact: Goats, such as {goat_name}, have uniquely shaped rectangular pupils, which provide them a wide field of vision, aiding in predator detection.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡ Contribution confirmed: {new_amount} sats received. {difference_message} Fun fact: {goat_name} and other goats are incredibly agile climbers, capable of scaling steep terrain with ease.\n\n https://lightning-goats.com\n\n", None),
    ("2", "💎 Payment processed: {new_amount} sats contributed. {difference_message} Did you know? {goat_name} represents the curious and intelligent nature of goats in general.\n\n https://lightning-goats.com\n\n", None),
    ("3", "🔥 Sats received: {new_amount} added to the pot. {difference_message} Interesting: Goats like {goat_name} have excellent memories and can recognize other goats and humans for years.\n\n https://lightning-goats.com\n\n", None),
    ("4", "⚡ CyberHerd grows: {new_amount} sats received. {difference_message} Goat trivia: {goat_name} exemplifies how goats use their prehensile tongues to selectively eat the most nutritious plants.\n\n https://lightning-goats.com\n\n", None),
];

const KIND_6_REPOST: &[Variant] = &[
    ("0", "{name} reposted their way into the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
    ("1", "A repost from {name} earned a spot in the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
    ("2", "Welcome, {name}. Your repost has been counted and you are now part of the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
];

const KIND_7_REACTION: &[Variant] = &[
    ("0", "{name} reacted and joined the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
    ("1", "A reaction from {name} secured a place in the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
    ("2", "Welcome, {name}. Your reaction has been counted and you are now part of the ⚡ CyberHerd ⚡.\n\n https://lightning-goats.com\n\n", None),
];

const KIND_6_HEADBUTT_FAILURE: &[Variant] = &[
    ("0", "⚡headbutt⚡: Thanks for the repost, {name}. The ⚡ CyberHerd ⚡ is full; a zap of {required_sats} sats will displace {victim_name}.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡headbutt⚡: {name}, reposts cannot displace members while the ⚡ CyberHerd ⚡ is at capacity. Zap {required_sats} sats to take the place of {victim_name}.\n\n https://lightning-goats.com\n\n", None),
];

const KIND_7_HEADBUTT_FAILURE: &[Variant] = &[
    ("0", "⚡headbutt⚡: Thanks for the reaction, {name}. The ⚡ CyberHerd ⚡ is full; a zap of {required_sats} sats will displace {victim_name}.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡headbutt⚡: {name}, reactions cannot displace members while the ⚡ CyberHerd ⚡ is at capacity. Zap {required_sats} sats to take the place of {victim_name}.\n\n https://lightning-goats.com\n\n", None),
];

const ZAPPER_DISPLACES_KIND_6: &[Variant] = &[
    ("0", "⚡headbutt⚡: {attacker_name} zapped {attacker_amount} sats and displaced {victim_name}, who had joined with a repost.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡headbutt⚡: A {attacker_amount} sat zap from {attacker_name} takes the ⚡ CyberHerd ⚡ spot held by {victim_name}'s repost.\n\n https://lightning-goats.com\n\n", None),
];

const ZAPPER_DISPLACES_KIND_7: &[Variant] = &[
    ("0", "⚡headbutt⚡: {attacker_name} zapped {attacker_amount} sats and displaced {victim_name}, who had joined with a reaction.\n\n https://lightning-goats.com\n\n", None),
    ("1", "⚡headbutt⚡: A {attacker_amount} sat zap from {attacker_name} takes the ⚡ CyberHerd ⚡ spot held by {victim_name}'s reaction.\n\n https://lightning-goats.com\n\n", None),
];

/// Every built-in pool by canonical category name
const BUILT_IN: &[(&str, &[Variant])] = &[
    ("cyber_herd_join", CYBER_HERD_JOIN),
    ("thank_you_variations", THANK_YOU_VARIATIONS),
    ("variations", VARIATIONS),
    ("cyber_herd_treats", CYBER_HERD_TREATS),
    ("headbutt_success", HEADBUTT_SUCCESS),
    ("headbutt_failure", HEADBUTT_FAILURE),
    ("headbutt_info", HEADBUTT_INFO),
    ("member_increase", MEMBER_INCREASE),
    ("daily_reset", DAILY_RESET),
    ("feeder_trigger", FEEDER_TRIGGER),
    ("feeding_regular", FEEDING_REGULAR),
    ("feeding_bonus", FEEDING_BONUS),
    ("feeding_remainder", FEEDING_REMAINDER),
    ("feeding_fallback", FEEDING_FALLBACK),
    ("interface_info", INTERFACE_INFO),
    ("sats_received", SATS_RECEIVED),
    ("kind_6_repost", KIND_6_REPOST),
    ("kind_7_reaction", KIND_7_REACTION),
    ("kind_6_headbutt_failure", KIND_6_HEADBUTT_FAILURE),
    ("kind_7_headbutt_failure", KIND_7_HEADBUTT_FAILURE),
    ("zapper_displaces_kind_6", ZAPPER_DISPLACES_KIND_6),
    ("zapper_displaces_kind_7", ZAPPER_DISPLACES_KIND_7),
];

lazy_static! {
    static ref DEFAULT_POOLS: HashMap<&'static str, TemplatePool> = BUILT_IN
        .iter()
        .map(|(category, variants)| (*category, build_pool(variants)))
        .collect();
}

fn build_pool(variants: &[Variant]) -> TemplatePool {
    let mut pool = TemplatePool::new();
    for (key, content, relay) in variants {
        let entry = match relay {
            Some(relay) => TemplateEntry::with_relay(*content, *relay),
            None => TemplateEntry::new(*content),
        };
        pool.insert(*key, entry);
    }
    pool
}

/// Built-in pool for a category. Accepts the legacy `_dict` suffix and any case.
pub fn default_pool(category: &str) -> Option<&'static TemplatePool> {
    let lowered = category.trim().to_lowercase();
    let canonical = lowered.strip_suffix("_dict").unwrap_or(&lowered);
    DEFAULT_POOLS.get(canonical)
}

/// Canonical names of every built-in pool, in catalogue order
pub fn default_categories() -> impl Iterator<Item = &'static str> {
    BUILT_IN.iter().map(|(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_pool_non_empty() {
        for category in default_categories() {
            let pool = default_pool(category).unwrap();
            assert!(!pool.is_empty(), "{} is empty", category);
        }
    }

    #[test]
    fn test_default_lookup_tolerates_suffix_and_case() {
        assert!(default_pool("DAILY_RESET_DICT").is_some());
        assert!(default_pool("sats_received_dict").is_some());
        assert!(default_pool("no_such_pool").is_none());
    }

    #[test]
    fn test_relay_hints_kept() {
        let join = default_pool("cyber_herd_join").unwrap();
        assert_eq!(
            join.get("0").and_then(|e| e.reply_relay.as_deref()),
            Some("https://relay.damus.io")
        );
        let variations = default_pool("variations").unwrap();
        assert_eq!(variations.len(), 11);
        assert!(variations.get("10").unwrap().reply_relay.is_none());
    }
}
