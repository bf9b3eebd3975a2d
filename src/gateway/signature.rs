//! Callback and notification hash verification
//!
//! The gateway signs inbound messages by appending the merchant passphrase
//! to the signed content and hashing with SHA-1. This is not an HMAC and
//! must stay byte-for-byte compatible with what the gateway computes.

use sha1::{Digest, Sha1};

/// Query parameter carrying the received hash on redirect callbacks
pub const HASH_PARAM: &str = "hash";

/// Expected hash for a redirect callback query.
///
/// Every parameter except `hash` with a non-empty value contributes
/// `key + value + passphrase`, in ascending key order.
pub fn callback_digest<I, K, V>(params: I, passphrase: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params
        .into_iter()
        .filter(|(key, _)| key.as_ref() != HASH_PARAM)
        .collect();
    pairs.sort_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));

    let mut hasher = Sha1::new();
    for (key, value) in &pairs {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }
        hasher.update(key.as_ref().as_bytes());
        hasher.update(value.as_bytes());
        hasher.update(passphrase.as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Expected hash for a server-to-server notification body.
pub fn notify_digest(raw_body: &str, passphrase: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(raw_body.as_bytes());
    hasher.update(passphrase.as_bytes());
    hex::encode(hasher.finalize())
}

/// Case-sensitive comparison that only leaks the length.
pub fn hashes_match(computed: &str, received: &str) -> bool {
    if computed.len() != received.len() {
        return false;
    }

    computed
        .as_bytes()
        .iter()
        .zip(received.as_bytes().iter())
        .fold(0, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Checks the `hash` entry of a callback query against its other parameters.
pub fn verify_callback<I, K, V>(params: I, passphrase: &str) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut received = None;
    let mut signed = Vec::new();
    for (key, value) in params {
        if key.as_ref() == HASH_PARAM {
            received = Some(value.as_ref().to_string());
        } else {
            signed.push((key, value));
        }
    }

    match received {
        Some(received) => hashes_match(&callback_digest(signed, passphrase), &received),
        None => false,
    }
}

pub fn verify_notify(raw_body: &str, received: &str, passphrase: &str) -> bool {
    hashes_match(&notify_digest(raw_body, passphrase), received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn sha1_hex(input: &str) -> String {
        hex::encode(Sha1::digest(input.as_bytes()))
    }

    #[test]
    fn test_sha1_known_vector() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_callback_digest_concatenation() {
        let params = vec![("b", "2"), ("a", "1")];
        assert_eq!(
            callback_digest(params, "secret"),
            sha1_hex("a1secretb2secret")
        );
    }

    #[test]
    fn test_callback_digest_skips_hash_and_empty_values() {
        let params = vec![("a", "1"), ("empty", ""), ("hash", "whatever"), ("b", "2")];
        assert_eq!(
            callback_digest(params, "secret"),
            sha1_hex("a1secretb2secret")
        );
    }

    #[test]
    fn test_callback_digest_sorts_by_byte_order() {
        // Uppercase sorts before lowercase in byte order
        let params = vec![("orderid", "O1"), ("Zeta", "z"), ("amount", "10")];
        assert_eq!(
            callback_digest(params, "pp"),
            sha1_hex("Zetazppamount10pporderidO1pp")
        );
    }

    #[test]
    fn test_callback_digest_of_nothing_is_empty_hash() {
        let params: Vec<(&str, &str)> = vec![("hash", "x")];
        assert_eq!(callback_digest(params, "secret"), sha1_hex(""));
    }

    #[test]
    fn test_verify_callback_accepts_valid_hash() {
        let mut query = HashMap::new();
        query.insert("a".to_string(), "1".to_string());
        query.insert("b".to_string(), "2".to_string());
        query.insert("hash".to_string(), sha1_hex("a1secretb2secret"));

        assert!(verify_callback(&query, "secret"));
        // Pure: same answer twice
        assert!(verify_callback(&query, "secret"));
    }

    #[test]
    fn test_verify_callback_rejects_any_value_mutation() {
        let expected = sha1_hex("a1secretb2secret");
        for (a, b) in [("0", "2"), ("1", "3"), ("11", "2"), ("1", "")] {
            let mut query = BTreeMap::new();
            query.insert("a", a);
            query.insert("b", b);
            query.insert("hash", expected.as_str());
            assert!(!verify_callback(&query, "secret"), "a={} b={}", a, b);
        }
    }

    #[test]
    fn test_verify_callback_wrong_passphrase_or_missing_hash() {
        let mut query = BTreeMap::new();
        query.insert("a", "1".to_string());
        query.insert("hash", sha1_hex("a1secret"));
        assert!(verify_callback(&query, "secret"));
        assert!(!verify_callback(&query, "other"));

        query.remove("hash");
        assert!(!verify_callback(&query, "secret"));
    }

    #[test]
    fn test_notify_digest() {
        assert_eq!(
            notify_digest("amount=10&currency=EUR", "secret"),
            sha1_hex("amount=10&currency=EURsecret")
        );
    }

    #[test]
    fn test_verify_notify_is_case_sensitive() {
        let hash = sha1_hex("amount=10&currency=EURsecret");
        assert!(verify_notify("amount=10&currency=EUR", &hash, "secret"));
        assert!(!verify_notify("amount=10&currency=EUR", &hash.to_uppercase(), "secret"));
        assert!(!verify_notify("amount=11&currency=EUR", &hash, "secret"));
        assert!(!verify_notify("amount=10&currency=EUR", "", "secret"));
    }

    #[test]
    fn test_hashes_match() {
        assert!(hashes_match("abc", "abc"));
        assert!(!hashes_match("abc", "abd"));
        assert!(!hashes_match("abc", "abcd"));
        assert!(!hashes_match("abc", "ABC"));
    }
}
