//! URL canonicalisation for merging results from several providers.

use url::Url;

/// Normalise a URL for duplicate detection.
///
/// Lowercases scheme and host, drops the fragment, drops a default port and strips a
/// trailing slash from non-root paths. Unparseable input is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    // The parser already lowercases scheme and host and drops default ports.
    parsed.set_fragment(None);

    let mut out = parsed.to_string();
    if parsed.query().is_none() && out.ends_with('/') && parsed.path() != "/" {
        out.pop();
    }
    out
}
