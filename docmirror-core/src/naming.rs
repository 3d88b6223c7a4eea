//! URL filtering and document name derivation.

/// Keep only URLs containing `pattern`, preserving order.
pub fn filter_urls(urls: &[String], pattern: &str) -> Vec<String> {
    urls.iter()
        .filter(|url| url.contains(pattern))
        .cloned()
        .collect()
}

/// Derive a stable document name from a URL.
///
/// Splits on the first occurrence of `pattern`, strips trailing slashes from
/// the remainder, and takes the final path segment. Returns `None` when the
/// URL does not contain the pattern or nothing is left after stripping; such
/// URLs are excluded from processing.
pub fn document_name(url: &str, pattern: &str) -> Option<String> {
    let (_, rest) = url.split_once(pattern)?;
    let rest = rest.trim_end_matches('/');
    rest.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}
