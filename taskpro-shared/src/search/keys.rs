/// Cache key derivation for search
///
/// Keys are pure functions of (namespace, owner, query) so that two requests
/// for the same normalized query by the same owner always land on the same
/// entry, and two owners never share one.
///
/// ```text
/// search:result:{owner_id}:{sha256(normalized_query)}   string, TTL
/// search:history:{owner_id}                             list, newest first
/// ```

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const RESULT_NAMESPACE: &str = "search:result";
pub const HISTORY_NAMESPACE: &str = "search:history";

/// Trims surrounding whitespace; inner whitespace and case are preserved
pub fn normalize_query(raw: &str) -> &str {
    raw.trim()
}

/// Lowercase hex SHA-256 of the query text
pub fn query_hash(normalized: &str) -> String {
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// `{namespace}:{owner_id}:{content_hash}`
pub fn cache_key(namespace: &str, owner_id: Uuid, content_hash: &str) -> String {
    format!("{}:{}:{}", namespace, owner_id, content_hash)
}

/// Result-cache key for an owner's query
pub fn result_key(owner_id: Uuid, normalized: &str) -> String {
    cache_key(RESULT_NAMESPACE, owner_id, &query_hash(normalized))
}

/// History list key for an owner
pub fn history_key(owner_id: Uuid) -> String {
    format!("{}:{}", HISTORY_NAMESPACE, owner_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_only() {
        assert_eq!(normalize_query("  bug  "), "bug");
        assert_eq!(normalize_query("Fix  Bug"), "Fix  Bug");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_query_hash_is_sha256_hex() {
        // sha256("") and sha256("abc") reference digests
        assert_eq!(
            query_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            query_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cache_key_format() {
        let owner = Uuid::nil();
        assert_eq!(
            cache_key(RESULT_NAMESPACE, owner, "abc"),
            "search:result:00000000-0000-0000-0000-000000000000:abc"
        );
        assert_eq!(
            history_key(owner),
            "search:history:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_result_key_is_deterministic_per_owner() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(result_key(owner, "bug"), result_key(owner, "bug"));
        assert_ne!(result_key(owner, "bug"), result_key(other, "bug"));
        assert_ne!(result_key(owner, "bug"), result_key(owner, "Bug"));
    }

    #[test]
    fn test_trimmed_variants_share_a_key() {
        let owner = Uuid::new_v4();
        assert_eq!(
            result_key(owner, normalize_query(" bug ")),
            result_key(owner, normalize_query("bug"))
        );
    }
}
