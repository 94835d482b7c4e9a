use url::Url;

/// Extracts the host from a URL, lowercased
///
/// Returns `None` for URLs without a host (e.g. `mailto:`).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use flare_kb::url::extract_domain;
///
/// let url = Url::parse("https://DOCS.flare.network/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.flare.network".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
