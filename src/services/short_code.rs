// Short code derivation
// crc32 of the canonical URL, base-36 encoded, left-padded to 7 characters

use lazy_static::lazy_static;
use regex::Regex;

/// Every code is exactly this long; u32::MAX is "1z141z3" in base 36.
pub const CODE_LENGTH: usize = 7;

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASE: u32 = 36;

lazy_static! {
    static ref SHORT_CODE_PATTERN: Regex =
        Regex::new(r"^[0-9a-z]{7}$").expect("Invalid short code pattern regex");
}

/// Encode a u32 in lowercase base 36 without padding
#[inline]
pub fn encode_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(CODE_LENGTH);
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();

    // Alphabet is ASCII
    digits.into_iter().map(char::from).collect()
}

/// Derive the code for `canonical_url`.
///
/// Attempt 0 hashes the URL itself. Later attempts re-salt the checksum input
/// with `#<attempt>` so a collision with another URL's code moves to a new code
/// while staying deterministic for the same URL.
pub fn derive_code(canonical_url: &str, attempt: u32) -> String {
    let checksum = if attempt == 0 {
        crc32fast::hash(canonical_url.as_bytes())
    } else {
        crc32fast::hash(format!("{}#{}", canonical_url, attempt).as_bytes())
    };

    format!("{:0>width$}", encode_base36(checksum), width = CODE_LENGTH)
}

/// Cheap format check before touching the store
pub fn is_valid_code(code: &str) -> bool {
    SHORT_CODE_PATTERN.is_match(code)
}
