use bech32::{Bech32, Hrp};

const NPUB: Hrp = Hrp::parse_unchecked("npub");
const NOTE: Hrp = Hrp::parse_unchecked("note");
pub(crate) const NSEC: Hrp = Hrp::parse_unchecked("nsec");

/// URI scheme prefix for references embedded in note content (NIP-21)
const NOSTR_SCHEME: &str = "nostr:";

/// Returns true for exactly 64 hex characters after trimming (case-insensitive).
pub fn is_valid_hex_id(value: &str) -> bool {
    let candidate = value.trim();
    candidate.len() == 64 && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

fn decode_hex_id(value: &str) -> Option<[u8; 32]> {
    if !is_valid_hex_id(value) {
        return None;
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(value.trim(), &mut bytes).ok()?;
    Some(bytes)
}

fn encode_with(hrp: Hrp, value: &str) -> Option<String> {
    let bytes = decode_hex_id(value)?;
    bech32::encode::<Bech32>(hrp, &bytes).ok()
}

/// Encode a 32-byte hex event id as a `note1…` reference.
///
/// Anything that is not exactly 64 hex characters yields `None`.
pub fn encode_event_ref(hex_id: &str) -> Option<String> {
    encode_with(NOTE, hex_id)
}

/// Encode a 32-byte hex public key as an `npub1…` reference.
pub fn encode_pubkey_ref(hex_pubkey: &str) -> Option<String> {
    encode_with(NPUB, hex_pubkey)
}

/// Decode an `npub1…` reference (with or without the `nostr:` scheme) back to lowercase hex.
pub fn decode_pubkey_ref(reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    let bare = trimmed.strip_prefix(NOSTR_SCHEME).unwrap_or(trimmed);
    let (hrp, data) = bech32::decode(bare).ok()?;
    if hrp != NPUB || data.len() != 32 {
        return None;
    }
    Some(hex::encode(data))
}

/// Prefix a reference with the `nostr:` scheme unless already present.
pub fn nostr_uri(reference: &str) -> String {
    if reference.starts_with(NOSTR_SCHEME) {
        reference.to_string()
    } else {
        format!("{}{}", NOSTR_SCHEME, reference)
    }
}

/// Normalise a profile token (`nprofile1…`) for embedding in content.
///
/// Blank input yields `None`.
pub fn normalize_profile_ref(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(nostr_uri(trimmed))
}
