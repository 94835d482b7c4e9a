//! URL handling module for flare-kb
//!
//! This module provides URL normalization, host extraction, host matching,
//! and the admission filter that decides which discovered URLs are crawled.

mod domain;
mod matcher;
mod normalize;

use crate::config::{default_excluded_extensions, AdmissionConfig};
use serde::Deserialize;
use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::{has_excluded_extension, matches_host};
pub use normalize::normalize_url;

/// Host matching policy for admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Host must be one of the configured hosts
    Exact,
    /// Host must be a configured suffix or a subdomain of one
    Suffix,
}

/// Decides whether a discovered URL is eligible to crawl
///
/// A URL is admissible iff its host matches the configured hosts under the
/// configured [`AdmissionMode`] AND its path does not end with an excluded
/// extension. Malformed URLs are never admissible.
///
/// # Examples
///
/// ```
/// use flare_kb::url::{AdmissionFilter, AdmissionMode};
///
/// let filter = AdmissionFilter::new(AdmissionMode::Suffix, ["flare.network"]);
/// assert!(filter.admissible("https://docs.flare.network/intro"));
/// assert!(!filter.admissible("https://flare.network/logo.png"));
/// assert!(!filter.admissible("https://example.com/"));
/// assert!(!filter.admissible("not a url"));
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    mode: AdmissionMode,
    hosts: Vec<String>,
    excluded_extensions: Vec<String>,
}

impl AdmissionFilter {
    /// Creates a filter with the default excluded extensions
    pub fn new<I, S>(mode: AdmissionMode, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mode,
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().to_lowercase())
                .collect(),
            excluded_extensions: default_excluded_extensions(),
        }
    }

    /// Creates a filter from the `[admission]` configuration section
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.mode, &config.hosts)
            .with_excluded_extensions(config.excluded_extensions.iter())
    }

    /// Replaces the excluded extension list
    pub fn with_excluded_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Returns the host matching policy
    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    /// Returns true if the URL may be crawled
    pub fn admissible(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.admits(&parsed),
            Err(_) => false,
        }
    }

    /// Same as [`admissible`](Self::admissible) for an already parsed URL
    pub fn admits(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match extract_domain(url) {
            Some(h) => h,
            None => return false,
        };

        if !self
            .hosts
            .iter()
            .any(|allowed| matches_host(self.mode, allowed, &host))
        {
            return false;
        }

        !has_excluded_extension(url.path(), &self.excluded_extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix_filter() -> AdmissionFilter {
        AdmissionFilter::new(AdmissionMode::Suffix, ["flare.network"])
    }

    fn exact_filter() -> AdmissionFilter {
        AdmissionFilter::new(
            AdmissionMode::Exact,
            ["flare.network", "docs.flare.network", "dev.flare.network"],
        )
    }

    #[test]
    fn test_suffix_mode_admits_subdomains() {
        let filter = suffix_filter();
        assert!(filter.admissible("https://flare.network/"));
        assert!(filter.admissible("https://docs.flare.network/tech/flare"));
        assert!(filter.admissible("https://a.b.flare.network/x"));
    }

    #[test]
    fn test_suffix_mode_respects_label_boundary() {
        let filter = suffix_filter();
        assert!(!filter.admissible("https://evilflare.network/"));
        assert!(!filter.admissible("https://flare.network.example.com/"));
    }

    #[test]
    fn test_exact_mode() {
        let filter = exact_filter();
        assert!(filter.admissible("https://flare.network/about"));
        assert!(filter.admissible("https://dev.flare.network/intro"));
        assert!(!filter.admissible("https://blog.flare.network/"));
    }

    #[test]
    fn test_host_case_insensitive() {
        let filter = AdmissionFilter::new(AdmissionMode::Exact, ["Flare.Network"]);
        assert!(filter.admissible("https://FLARE.network/"));
    }

    #[test]
    fn test_excluded_extensions_regardless_of_host() {
        let filters = [suffix_filter(), exact_filter()];
        let urls = [
            "https://flare.network/style.css",
            "https://flare.network/app.js",
            "https://docs.flare.network/img/photo.JPG",
            "https://flare.network/a.jpeg",
            "https://flare.network/logo.png",
            "https://flare.network/anim.gif",
            "https://dev.flare.network/whitepaper.pdf",
            "https://example.com/logo.png",
        ];
        for filter in &filters {
            for url in urls {
                assert!(!filter.admissible(url), "{} should be excluded", url);
            }
        }
    }

    #[test]
    fn test_extension_checked_on_path_only() {
        let filter = suffix_filter();
        assert!(filter.admissible("https://flare.network/page?file=logo.png"));
        assert!(filter.admissible("https://flare.network/page#logo.png"));
        assert!(filter.admissible("https://flare.network/js/"));
    }

    #[test]
    fn test_custom_extensions() {
        let filter = suffix_filter().with_excluded_extensions([".zip"]);
        assert!(filter.admissible("https://flare.network/logo.png"));
        assert!(!filter.admissible("https://flare.network/release.zip"));
    }

    #[test]
    fn test_malformed_urls_inadmissible() {
        let filter = suffix_filter();
        assert!(!filter.admissible(""));
        assert!(!filter.admissible("not a url"));
        assert!(!filter.admissible("https://"));
        assert!(!filter.admissible("/relative/path"));
        assert!(!filter.admissible("mailto:team@flare.network"));
        assert!(!filter.admissible("ftp://flare.network/file"));
    }

    #[test]
    fn test_from_config() {
        let config = AdmissionConfig {
            mode: AdmissionMode::Exact,
            hosts: vec!["flare.network".to_string()],
            excluded_extensions: vec![".svg".to_string()],
        };
        let filter = AdmissionFilter::from_config(&config);
        assert_eq!(filter.mode(), AdmissionMode::Exact);
        assert!(!filter.admissible("https://flare.network/icon.svg"));
        assert!(filter.admissible("https://flare.network/logo.png"));
    }
}
