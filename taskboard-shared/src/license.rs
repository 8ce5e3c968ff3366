/// License key generation and format validation
///
/// License keys are single-use credentials that gate registration. They
/// follow the format `AAAA-BBBB-CCCC-DDDD`: four hyphen-joined groups of
/// four uppercase alphanumeric characters.
///
/// # Security
///
/// Keys gate paid access, so the groups are drawn from the operating
/// system's CSPRNG rather than a seedable generator. Key space:
/// 36^16 ≈ 2^82 combinations.
///
/// # Example
///
/// ```
/// use taskboard_shared::license::{generate_license_key, is_valid_key_format};
///
/// let key = generate_license_key();
/// assert!(is_valid_key_format(&key));
/// assert_eq!(key.len(), 19);
/// ```

use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;

/// Characters allowed in a license key group
const KEY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of groups in a key
const KEY_GROUPS: usize = 4;

/// Characters per group
const KEY_GROUP_LENGTH: usize = 4;

/// Maximum number of insert attempts before key generation is considered
/// exhausted. Hitting this bound signals an operational problem (e.g., a
/// near-saturated key space), not a transient failure.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

static KEY_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$")
        .expect("license key regex is valid")
});

/// Generates a random license key in the format `AAAA-BBBB-CCCC-DDDD`
///
/// Uniqueness is NOT guaranteed here; callers insert against the unique
/// `key` column and retry on collision.
///
/// # Example
///
/// ```
/// use taskboard_shared::license::generate_license_key;
///
/// let key = generate_license_key();
/// assert_eq!(key.matches('-').count(), 3);
/// ```
pub fn generate_license_key() -> String {
    let mut rng = OsRng;

    let groups: Vec<String> = (0..KEY_GROUPS)
        .map(|_| {
            (0..KEY_GROUP_LENGTH)
                .map(|_| {
                    let idx = rng.gen_range(0..KEY_CHARSET.len());
                    KEY_CHARSET[idx] as char
                })
                .collect()
        })
        .collect();

    groups.join("-")
}

/// Checks that a key matches `AAAA-BBBB-CCCC-DDDD` (uppercase alphanumeric)
///
/// # Example
///
/// ```
/// use taskboard_shared::license::is_valid_key_format;
///
/// assert!(is_valid_key_format("ABCD-1234-WXYZ-5678"));
/// assert!(!is_valid_key_format("abcd-1234-wxyz-5678"));
/// assert!(!is_valid_key_format("ABCD-1234-WXYZ"));
/// ```
pub fn is_valid_key_format(key: &str) -> bool {
    KEY_FORMAT.is_match(key)
}

/// Normalizes a raw key for lookup: trims whitespace and uppercases
///
/// Lookups and the registration flow both normalize, so users can paste
/// keys with stray whitespace or lowercase letters.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_matches_format() {
        for _ in 0..100 {
            let key = generate_license_key();
            assert!(is_valid_key_format(&key), "bad key: {}", key);
        }
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = generate_license_key();
        let b = generate_license_key();
        // 36^16 key space; a collision here means the RNG is broken.
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_rejects_bad_keys() {
        assert!(!is_valid_key_format(""));
        assert!(!is_valid_key_format("ABCD-1234-WXYZ-567"));
        assert!(!is_valid_key_format("ABCD-1234-WXYZ-5678-9999"));
        assert!(!is_valid_key_format("ABCD_1234_WXYZ_5678"));
        assert!(!is_valid_key_format("abcd-1234-wxyz-5678"));
        assert!(!is_valid_key_format("AB!D-1234-WXYZ-5678"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  abcd-1234-wxyz-5678 "), "ABCD-1234-WXYZ-5678");
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("  \t "), "");
    }

    #[test]
    fn test_normalized_pasted_key_is_valid() {
        let key = format!("  {}  ", generate_license_key().to_lowercase());
        assert!(is_valid_key_format(&normalize_key(&key)));
    }
}
