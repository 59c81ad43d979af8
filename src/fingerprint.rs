//! Revision fingerprints.
//!
//! A revision's fingerprint is a SHA-256 digest over its title and content,
//! stored next to the revision at creation time. Revisions are immutable, so
//! a fingerprint that no longer matches the stored page means the row was
//! modified outside the store.
//!
//! ## Encoding
//!
//! ```text
//! fingerprint = hex(SHA256(len(title) as u64 LE || title || content))
//! ```
//!
//! The length prefix keeps `("ab", "c")` and `("a", "bc")` apart. No
//! normalization is applied, so two edits that differ only in whitespace are
//! different pages.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of a page.
///
/// Returned as a 64-character lowercase hex string.
///
/// # Example
///
/// ```rust
/// use social_wiki::fingerprint::compute_fingerprint;
///
/// let fp = compute_fingerprint("Title", "Body");
/// assert_eq!(fp.len(), 64);
/// ```
pub fn compute_fingerprint(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((title.len() as u64).to_le_bytes());
    hasher.update(title.as_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a stored fingerprint against a page.
///
/// Uses constant-time comparison.
pub fn verify_fingerprint(title: &str, content: &str, expected: &str) -> bool {
    let computed = compute_fingerprint(title, content);

    if computed.len() != expected.len() {
        return false;
    }

    computed
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_determinism() {
        assert_eq!(compute_fingerprint("t", "c"), compute_fingerprint("t", "c"));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = compute_fingerprint("title", "");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_field_boundary() {
        assert_ne!(compute_fingerprint("ab", "c"), compute_fingerprint("a", "bc"));
    }

    #[test]
    fn test_fingerprint_whitespace_is_significant() {
        assert_ne!(compute_fingerprint("t", "c"), compute_fingerprint("t", "c "));
        assert_ne!(compute_fingerprint("t", "c"), compute_fingerprint("t", "c\r\n"));
    }

    #[test]
    fn test_verify_fingerprint() {
        let fp = compute_fingerprint("Hello", "World");
        assert!(verify_fingerprint("Hello", "World", &fp));
        assert!(!verify_fingerprint("Hello", "World!", &fp));
        assert!(!verify_fingerprint("Hello", "World", "abc"));
    }

    #[test]
    fn test_unicode_fingerprint() {
        for (title, content) in [("Ñoño", "α + β = γ"), ("Hello 世界", "🎉")] {
            let fp = compute_fingerprint(title, content);
            assert!(verify_fingerprint(title, content, &fp));
        }
    }
}
