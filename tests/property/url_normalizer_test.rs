//! Property-based tests for URL canonicalization.
//!
//! Saved URLs never carry `utm_*` parameters, and canonicalizing twice gives
//! the same result as canonicalizing once.

use linkshelf::services::url_normalizer::{is_valid, normalize};
use proptest::prelude::*;

fn query_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        "utm_[a-z]{1,8}",
    ]
}

fn query_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((query_key(), "[a-z0-9]{0,8}"), 0..8)
}

fn build_url(host: &str, path: &str, pairs: &[(String, String)]) -> String {
    let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    if query.is_empty() {
        format!("https://{}/{}", host, path)
    } else {
        format!("https://{}/{}?{}", host, path, query.join("&"))
    }
}

// **Property 1: Tracking parameters are removed**
//
// *For any* query mixing ordinary and `utm_` keys, the canonical URL SHALL
// keep every ordinary key and no `utm_` key.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn normalize_strips_every_utm_key(
        host in "[a-z]{1,10}\\.(com|org|net)",
        path in "[a-z]{0,10}",
        pairs in query_pairs(),
    ) {
        let raw = build_url(&host, &path, &pairs);
        let normalized = normalize(&raw).expect("generated URL should be valid");
        let parsed = url::Url::parse(&normalized).unwrap();

        prop_assert!(parsed.query_pairs().all(|(k, _)| !k.starts_with("utm_")));

        let kept = pairs.iter().filter(|(k, _)| !k.starts_with("utm_")).count();
        prop_assert_eq!(parsed.query_pairs().count(), kept);
        if kept == 0 {
            prop_assert!(parsed.query().is_none(), "An emptied query must be dropped entirely");
        }
    }
}

// **Property 2: Canonicalization is idempotent**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn normalize_is_idempotent(
        host in "[a-z]{1,10}\\.(com|org|net)",
        path in "[a-z]{0,10}",
        pairs in query_pairs(),
    ) {
        let once = normalize(&build_url(&host, &path, &pairs)).unwrap();
        let twice = normalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}

// **Property 3: Query order does not matter**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn normalize_ignores_distinct_key_order(
        values in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{1,6}", 1..6),
    ) {
        let pairs: Vec<(String, String)> = values.into_iter().collect();
        let mut reversed = pairs.clone();
        reversed.reverse();

        let a = normalize(&build_url("example.com", "p", &pairs)).unwrap();
        let b = normalize(&build_url("example.com", "p", &reversed)).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn rejects_relative_and_hostless_urls() {
    for raw in ["", "example.com/page", "/just/a/path", "mailto:someone@example.com", "not a url"] {
        assert!(!is_valid(raw), "'{}' must be rejected", raw);
    }
}

#[test]
fn keeps_fragment_and_path() {
    let out = normalize("https://example.com/docs/page?utm_source=feed#section").unwrap();
    assert_eq!(out, "https://example.com/docs/page#section");
}
