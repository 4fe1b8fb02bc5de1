//! URL canonicalization.
//!
//! Accepts only absolute URLs with a host, removes `utm_*` tracking
//! parameters, and re-encodes the remaining query with keys in sorted
//! order so equal URLs compare equal.

use url::Url;

use crate::types::errors::BookmarkError;

/// Query keys starting with this prefix are dropped.
const TRACKING_PREFIX: &str = "utm_";

/// Parses and canonicalizes `raw`.
///
/// # Errors
/// `BookmarkError::InvalidUrl` when `raw` is not absolute or has no host.
pub fn normalize(raw: &str) -> Result<String, BookmarkError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|_| BookmarkError::InvalidUrl(raw.to_string()))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(BookmarkError::InvalidUrl(raw.to_string())),
    }

    if url.query().is_some() {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !key.starts_with(TRACKING_PREFIX))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        // Stable: repeated keys keep their relative order.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    Ok(url.to_string())
}

/// Returns true when `raw` passes [`normalize`].
pub fn is_valid(raw: &str) -> bool {
    normalize(raw).is_ok()
}
