//! HTML extraction of title, visible text and links
//!
//! Extraction is pure over the fetched body. Malformed markup never fails:
//! the HTML parser recovers, and whatever it recovers is what gets indexed.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Page title, empty if the page has none
    pub title: String,

    /// Visible text nodes, trimmed and joined with single spaces
    pub content: String,

    /// Absolute outbound link targets in document order, without duplicates
    pub links: Vec<String>,
}

/// Parses HTML content and extracts title, text and links
///
/// # Title
///
/// Text of the first `<title>`, falling back to the first `<h1>`; empty if
/// neither holds text.
///
/// # Content
///
/// Every text node outside `<head>`, `<script>`, `<style>`, `<noscript>` and
/// `<template>`, trimmed, with empty nodes dropped, joined by one space in
/// document order.
///
/// # Links
///
/// **Include:** `<a href="...">` resolved against `base_url`, HTTP(S) only.
///
/// **Exclude:** `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only
/// hrefs.
///
/// # Example
///
/// ```
/// use flare_kb::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Flare</title></head><body><p>Hello</p><a href="/about">About</a></body></html>"#;
/// let base_url = Url::parse("https://flare.network/").unwrap();
/// let page = extract_page(html, &base_url);
/// assert_eq!(page.title, "Flare");
/// assert_eq!(page.content, "Hello About");
/// assert_eq!(page.links, vec!["https://flare.network/about".to_string()]);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> Extraction {
    let document = Html::parse_document(html);

    Extraction {
        title: extract_title(&document),
        content: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|sel| Selector::parse(sel).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_default()
}

/// Collects visible text nodes in document order
fn extract_text(document: &Html) -> String {
    let mut pieces = Vec::new();
    collect_text(document.root_element(), &mut pieces);
    pieces.join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, pieces: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed);
                }
            }
            Node::Element(el) if !HIDDEN_ELEMENTS.contains(&el.name()) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, pieces);
                }
            }
            _ => {}
        }
    }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let a_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for element in document.select(&a_selector) {
        if let Some(absolute_url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        {
            if seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}

/// Trims and collapses internal whitespace runs to one space
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://flare.network/news/").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Flare   Network </title></head><body></body></html>"#;
        assert_eq!(extract_page(html, &base_url()).title, "Flare Network");
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = r#"<html><body><h1>Developer Hub</h1><p>text</p></body></html>"#;
        assert_eq!(extract_page(html, &base_url()).title, "Developer Hub");
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body><p>text</p></body></html>"#;
        assert_eq!(extract_page(html, &base_url()).title, "");
    }

    #[test]
    fn test_content_in_document_order() {
        let html = r#"
            <html><head><title>T</title></head>
            <body>
                <h2>  First   </h2>
                <p>Second <b>bold</b> third</p>
                <ul><li>Fourth</li></ul>
            </body></html>
        "#;
        assert_eq!(
            extract_page(html, &base_url()).content,
            "First Second bold third Fourth"
        );
    }

    #[test]
    fn test_hidden_text_skipped() {
        let html = r#"
            <html><head><title>Title only</title><style>p{}</style></head>
            <body>
                <script>var secret = 1;</script>
                <noscript>Enable JS</noscript>
                <p>Visible</p>
            </body></html>
        "#;
        assert_eq!(extract_page(html, &base_url()).content, "Visible");
    }

    #[test]
    fn test_extract_absolute_and_relative_links() {
        let html = r#"<html><body>
            <a href="https://docs.flare.network/intro">Docs</a>
            <a href="/about">About</a>
            <a href="ftso">FTSO</a>
            <a href="../careers">Careers</a>
        </body></html>"#;
        assert_eq!(
            extract_page(html, &base_url()).links,
            vec![
                "https://docs.flare.network/intro".to_string(),
                "https://flare.network/about".to_string(),
                "https://flare.network/news/ftso".to_string(),
                "https://flare.network/careers".to_string(),
            ]
        );
    }

    #[test]
    fn test_links_deduplicated() {
        let html = r#"<html><body><a href="/a">1</a><a href="/a">2</a><a href="/b">3</a></body></html>"#;
        assert_eq!(extract_page(html, &base_url()).links.len(), 2);
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"<html><body>
            <a href="javascript:void(0)">JS</a>
            <a href="JavaScript:alert(1)">JS</a>
            <a href="mailto:team@flare.network">Mail</a>
            <a href="tel:+1234567890">Call</a>
            <a href="data:text/html,hi">Data</a>
            <a href="#section">Jump</a>
            <a href="">Empty</a>
            <a>No href</a>
        </body></html>"##;
        assert!(extract_page(html, &base_url()).links.is_empty());
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let html = "<html><body><p>Unclosed <div>nested <a href='/x'>x";
        let page = extract_page(html, &base_url());
        assert_eq!(page.content, "Unclosed nested x");
        assert_eq!(page.links, vec!["https://flare.network/x".to_string()]);
    }

    #[test]
    fn test_empty_body() {
        let page = extract_page("", &base_url());
        assert_eq!(page, Extraction::default());
    }
}
