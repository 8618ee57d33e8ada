//! Nostr protocol primitives used when composing messages.
//!
//! - NIP-19 bech32 references (`npub`, `note`, `nsec`) and profile tokens
//! - Private key sanitising for the local signing path
//! - Relay hint normalisation (http(s) -> ws(s))
//! - NIP-10 reference tag composition
//! - Unsigned/signed event wire types

mod codec;
mod event;
mod keys;
mod relay;
mod tags;

pub use codec::{
    decode_pubkey_ref, encode_event_ref, encode_pubkey_ref, is_valid_hex_id, nostr_uri,
    normalize_profile_ref,
};
pub use event::{SignedEvent, UnsignedNote, KIND_LIVE_CHAT_MESSAGE, KIND_TEXT_NOTE};
pub use keys::{sanitize_private_key, KeyError};
pub use relay::normalize_relay_hint;
pub use tags::{compose_tags, Tag, TagRequest, LIVE_EVENT_PREFIX};
