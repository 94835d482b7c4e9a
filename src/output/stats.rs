//! Statistics generation from the knowledge-base database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{RunRecord, Storage, StorageResult};

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored pages
    pub total_pages: u64,

    /// Page counts per source label, largest first
    pub pages_by_source: Vec<(String, u64)>,

    /// Number of stored repositories
    pub total_repositories: u64,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CrawlStatistics> {
    let total_pages = storage.count_pages()?;
    let mut pages_by_source = storage.count_pages_by_source()?;
    pages_by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let total_repositories = storage.count_repositories()?;
    let latest_run = storage.get_latest_run()?;

    Ok(CrawlStatistics {
        total_pages,
        pages_by_source,
        total_repositories,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Knowledge Base Statistics ===\n");

    println!("Overview:");
    println!("  Total pages: {}", stats.total_pages);
    println!("  Repositories: {}", stats.total_repositories);
    println!();

    if !stats.pages_by_source.is_empty() {
        println!("Pages by Source:");
        for (source, count) in &stats.pages_by_source {
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", source, count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
        }
        None => println!("No runs recorded"),
    }
}
