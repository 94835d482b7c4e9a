use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Canonicalizes a URL for frontier deduplication and storage
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP(S) scheme and a host
/// 3. Remove the fragment (same document, different anchor)
/// 4. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`),
///    keeping the order of the rest
/// 5. Remove an empty query string
///
/// Host lowercasing and dot-segment removal are done by the parser itself.
/// Paths are otherwise left alone: `/about` and `/about/` stay distinct.
///
/// # Examples
///
/// ```
/// use flare_kb::url::normalize_url;
///
/// let url = normalize_url("https://Flare.Network/about?utm_source=x#team").unwrap();
/// assert_eq!(url.as_str(), "https://flare.network/about");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let segments: Vec<&str> = query.split('&').collect();
        if segments.iter().any(|s| is_tracking_segment(s)) {
            // Rejoin the raw segments; re-encoding would change the URL
            let kept = segments
                .iter()
                .filter(|s| !s.is_empty() && !is_tracking_segment(s))
                .copied()
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(if kept.is_empty() { None } else { Some(&kept) });
        } else if query.is_empty() {
            url.set_query(None);
        }
    }

    Ok(url)
}

/// Checks if a raw `key=value` query segment carries a tracking parameter
fn is_tracking_segment(segment: &str) -> bool {
    let key = segment.split('=').next().unwrap_or_default();
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
