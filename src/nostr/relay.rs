/// Map a relay hint to a websocket URL.
///
/// `https://` becomes `wss://`, `http://` becomes `ws://`, websocket URLs pass
/// through unchanged and anything else yields `None`.
pub fn normalize_relay_hint(raw: &str) -> Option<String> {
    let hint = raw.trim();
    if hint.starts_with("wss://") || hint.starts_with("ws://") {
        return Some(hint.to_string());
    }
    if let Some(rest) = hint.strip_prefix("https://") {
        return Some(format!("wss://{}", rest));
    }
    if let Some(rest) = hint.strip_prefix("http://") {
        return Some(format!("ws://{}", rest));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_schemes_mapped() {
        assert_eq!(
            normalize_relay_hint("https://relay.damus.io").as_deref(),
            Some("wss://relay.damus.io")
        );
        assert_eq!(
            normalize_relay_hint("http://r.example").as_deref(),
            Some("ws://r.example")
        );
    }

    #[test]
    fn test_websocket_passthrough() {
        assert_eq!(
            normalize_relay_hint(" wss://nos.lol ").as_deref(),
            Some("wss://nos.lol")
        );
        assert_eq!(
            normalize_relay_hint("ws://localhost:7777").as_deref(),
            Some("ws://localhost:7777")
        );
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(normalize_relay_hint("").is_none());
        assert!(normalize_relay_hint("relay.damus.io").is_none());
        assert!(normalize_relay_hint("ftp://relay.example").is_none());
    }
}
