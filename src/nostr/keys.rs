use thiserror::Error;

use super::codec::NSEC;

/// Private key sanitising failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("no private key material supplied")]
    Missing,

    #[error("invalid nsec encoding: {0}")]
    InvalidBech32(String),

    #[error("invalid key length {0}, need at least 64 hex characters")]
    InvalidLength(usize),
}

/// Reduce user-supplied key material to exactly 64 lowercase hex characters.
///
/// Accepted forms: raw hex (any case, with stray whitespace), a `0x` prefix,
/// or an `nsec1…` bech32 secret key. Non-hex characters are discarded and the
/// first 64 remaining digits are kept.
pub fn sanitize_private_key(raw: &str) -> Result<String, KeyError> {
    let compact: String = raw.split_whitespace().collect();
    if compact.is_empty() {
        return Err(KeyError::Missing);
    }

    let decoded;
    let material = if compact.to_ascii_lowercase().starts_with("nsec1") {
        decoded = decode_nsec(&compact)?;
        decoded.as_str()
    } else {
        compact.as_str()
    };

    let material = material
        .strip_prefix("0x")
        .or_else(|| material.strip_prefix("0X"))
        .unwrap_or(material);

    let hex_only: String = material
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if hex_only.len() < 64 {
        return Err(KeyError::InvalidLength(hex_only.len()));
    }

    Ok(hex_only[..64].to_string())
}

fn decode_nsec(value: &str) -> Result<String, KeyError> {
    let (hrp, data) =
        bech32::decode(value).map_err(|e| KeyError::InvalidBech32(e.to_string()))?;
    if hrp != NSEC {
        return Err(KeyError::InvalidBech32(format!("unexpected prefix {}", hrp)));
    }
    if data.len() != 32 {
        return Err(KeyError::InvalidLength(data.len() * 2));
    }
    Ok(hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::Bech32;

    const KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    #[test]
    fn test_plain_hex_passes() {
        assert_eq!(sanitize_private_key(KEY).unwrap(), KEY);
    }

    #[test]
    fn test_whitespace_case_and_prefix() {
        let messy = format!("  0x{}\n{} ", &KEY[..32].to_uppercase(), &KEY[32..]);
        assert_eq!(sanitize_private_key(&messy).unwrap(), KEY);
    }

    #[test]
    fn test_longer_input_truncated_to_64() {
        let long = format!("{}abcdef", KEY);
        assert_eq!(sanitize_private_key(&long).unwrap(), KEY);
    }

    #[test]
    fn test_short_input_rejected() {
        assert_eq!(
            sanitize_private_key(&KEY[..40]),
            Err(KeyError::InvalidLength(40))
        );
        assert_eq!(sanitize_private_key("   "), Err(KeyError::Missing));
    }

    #[test]
    fn test_nsec_decoded() {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(KEY, &mut bytes).unwrap();
        let nsec = bech32::encode::<Bech32>(NSEC, &bytes).unwrap();
        assert!(nsec.starts_with("nsec1"));
        assert_eq!(sanitize_private_key(&nsec).unwrap(), KEY);
    }

    #[test]
    fn test_corrupt_nsec_rejected() {
        assert!(matches!(
            sanitize_private_key("nsec1qqqqqq"),
            Err(KeyError::InvalidBech32(_))
        ));
    }
}
