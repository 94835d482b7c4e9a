//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with failure classification
//! - HTML text, title and link extraction
//! - The per-pass frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{
    run_crawl, CrawlPass, CrawlSession, CrawlState, PassReport, RunOptions, RunSummary,
};
pub use fetcher::{build_http_client, fetch_page, FetchFailure, FetchedPage};
pub use frontier::Frontier;
pub use parser::{extract_page, Extraction};
