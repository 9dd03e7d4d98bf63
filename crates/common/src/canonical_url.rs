//! URL canonicalization for URL binding checks.
//!
//! The signer and the proxy may format the same URL differently (parameter
//! order, a trailing `&` or `?`). Both sides are reduced to
//!
//! ```text
//! origin + path + ['?' + sorted query]
//! ```
//!
//! before comparison. Query pairs are sorted by their literal `name,value`
//! string and re-serialized as `application/x-www-form-urlencoded`.

use url::{form_urlencoded, Url};

/// Canonicalize a URL for equality comparison.
///
/// Input that does not parse as an absolute URL with a host is not an
/// error: a single trailing `&` or `?` is stripped and the rest is
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use common::canonical_url::canonicalize;
///
/// assert_eq!(
///     canonicalize("https://api.example/x?b=2&a=1"),
///     canonicalize("https://api.example/x?a=1&b=2&"),
/// );
/// assert_eq!(canonicalize("not a url?"), "not a url");
/// ```
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if url.origin().is_tuple() => canonicalize_parsed(&url),
        _ => strip_trailing_separator(raw).to_string(),
    }
}

fn canonicalize_parsed(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort_by_cached_key(|(name, value)| format!("{name},{value}"));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    let mut canonical = url.origin().ascii_serialization();
    canonical.push_str(url.path());
    if !query.is_empty() {
        canonical.push('?');
        canonical.push_str(&query);
    }
    canonical
}

fn strip_trailing_separator(raw: &str) -> &str {
    raw.strip_suffix('&')
        .or_else(|| raw.strip_suffix('?'))
        .unwrap_or(raw)
}
