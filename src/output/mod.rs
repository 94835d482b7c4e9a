//! Output module for reporting on the knowledge base
//!
//! This module handles:
//! - Loading and printing store statistics
//! - Formatting full-text search results

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::storage::{RepositoryHit, SearchHit, Storage, StorageResult};

/// Results of one query over pages and repositories
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub pages: Vec<SearchHit>,
    pub repositories: Vec<RepositoryHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.repositories.is_empty()
    }
}

/// Runs `query` against both full-text indexes
pub fn search_all(storage: &dyn Storage, query: &str) -> StorageResult<SearchResults> {
    Ok(SearchResults {
        pages: storage.search(query)?,
        repositories: storage.search_repositories(query)?,
    })
}

/// Formats a page hit as `URL: <url>, Title: <title>`
pub fn format_page_hit(hit: &SearchHit) -> String {
    format!("URL: {}, Title: {}", hit.url, hit.title)
}

/// Formats a repository hit as `Repository: <name>, Description: <description>`
pub fn format_repository_hit(hit: &RepositoryHit) -> String {
    format!("Repository: {}, Description: {}", hit.name, hit.description)
}

/// Prints search results to stdout, best match first
pub fn print_search_results(query: &str, results: &SearchResults) {
    if results.is_empty() {
        println!("No results for '{}'", query);
        return;
    }

    for hit in &results.pages {
        println!("{}", format_page_hit(hit));
    }
    for hit in &results.repositories {
        println!("{}", format_repository_hit(hit));
    }
}
