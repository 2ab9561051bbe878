//! Decoding of human-entered Base32 secrets.
//!
//! Secrets are usually shown to users in groups (`JBSW Y3DP EHPK 3PXP`) or
//! with dashes, in either case and often without the trailing `=` padding.
//! [`decode`] accepts all of these forms.

use std::sync::OnceLock;

use data_encoding::{DecodeError, DecodeKind, Encoding, BASE32, BASE32_NOPAD};

use crate::OtpError;

const SEPARATORS: [char; 2] = [' ', '-'];
const PADDING: char = '=';
const BLOCK_LEN: usize = 8;

/// RFC 4648 Base32, padded, accepting lower case input and ignoring
/// non-zero trailing bits in the last block.
///
/// # Panics
/// If the specification derived from `BASE32` is rejected by data-encoding.
/// It is built from constants only.
fn secret_encoding() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();

    ENCODING.get_or_init(|| {
        let mut spec = BASE32.specification();
        spec.check_trailing_bits = false;
        spec.translate.from.push_str("abcdefghijklmnopqrstuvwxyz");
        spec.translate.to.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        spec.encoding().expect("the Base32 specification is valid")
    })
}

/// Strips separators and restores the `=` padding so the length is a
/// multiple of 8.
pub fn normalize(secret: &str) -> String {
    let mut cleaned: String = secret.chars().filter(|c| !SEPARATORS.contains(c)).collect();

    let missing_padding = cleaned.len() % BLOCK_LEN;
    if missing_padding != 0 {
        cleaned.extend(std::iter::repeat(PADDING).take(BLOCK_LEN - missing_padding));
    }

    cleaned
}

/// Decodes a secret (given as an RFC4648 base32-encoded ASCII string)
/// into a byte string
pub fn decode(secret: &str) -> Result<Vec<u8>, OtpError> {
    let normalized = normalize(secret);

    // Padding is only allowed at the very end, not between 8-character blocks
    if let Some(position) = normalized.trim_end_matches(PADDING).find(PADDING) {
        return Err(OtpError::SecretDecode(DecodeError {
            position,
            kind: DecodeKind::Padding,
        }));
    }

    let key = secret_encoding()
        .decode(normalized.as_bytes())
        .map_err(OtpError::SecretDecode)?;

    if key.is_empty() {
        return Err(OtpError::EmptySecret);
    }

    Ok(key)
}

/// Encodes key bytes as unpadded, upper case Base32
pub fn encode(key: &[u8]) -> String {
    BASE32_NOPAD.encode(key)
}
