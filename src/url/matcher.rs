use crate::url::AdmissionMode;

/// Checks if a host matches an allowed host under the given mode
///
/// 1. Exact: "flare.network" matches only "flare.network"
/// 2. Suffix: "flare.network" matches:
///    - "flare.network" (the bare domain)
///    - "docs.flare.network" (single subdomain)
///    - "api.v2.flare.network" (nested subdomains)
///
/// Suffix matching works on label boundaries, so "evilflare.network" is not
/// a subdomain of "flare.network". Both arguments are expected lowercase.
///
/// # Examples
///
/// ```
/// use flare_kb::url::{matches_host, AdmissionMode};
///
/// assert!(matches_host(AdmissionMode::Exact, "flare.network", "flare.network"));
/// assert!(!matches_host(AdmissionMode::Exact, "flare.network", "docs.flare.network"));
///
/// assert!(matches_host(AdmissionMode::Suffix, "flare.network", "docs.flare.network"));
/// assert!(!matches_host(AdmissionMode::Suffix, "flare.network", "evilflare.network"));
/// ```
pub fn matches_host(mode: AdmissionMode, allowed: &str, candidate: &str) -> bool {
    match mode {
        AdmissionMode::Exact => candidate == allowed,
        AdmissionMode::Suffix => {
            candidate == allowed
                || candidate
                    .strip_suffix(allowed)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
    }
}

/// Returns true if the path ends with one of the extensions (case-insensitive)
pub fn has_excluded_extension(path: &str, extensions: &[String]) -> bool {
    let path = path.to_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}
