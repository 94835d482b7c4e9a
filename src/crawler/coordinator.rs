//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop and the run driver:
//! - [`CrawlSession`] drains one pass's frontier, fetching, extracting,
//!   storing and fanning out links
//! - [`run_crawl`] opens storage, runs every configured pass, then the
//!   repository collection, and records the run

use crate::config::{Config, PassConfig};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchedPage};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{extract_page, Extraction};
use crate::repos::RepoCollector;
use crate::storage::{open_storage, NewPage, Storage, StorageError};
use crate::url::AdmissionFilter;
use crate::KbError;
use chrono::Utc;
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// How often progress is logged, in pages
const PROGRESS_INTERVAL: u64 = 10;

/// One named crawl pass over a site section
#[derive(Debug, Clone)]
pub struct CrawlPass {
    /// Source label stored with every page
    pub label: String,
    /// Trusted start URL, admitted without filtering
    pub start_url: String,
    /// Stop after this many URLs have been taken, if set
    pub max_pages: Option<u32>,
}

impl CrawlPass {
    pub fn new(label: &str, start_url: &str) -> Self {
        Self {
            label: label.to_string(),
            start_url: start_url.to_string(),
            max_pages: None,
        }
    }
}

impl From<&PassConfig> for CrawlPass {
    fn from(config: &PassConfig) -> Self {
        Self {
            label: config.label.clone(),
            start_url: config.start_url.clone(),
            max_pages: config.max_pages,
        }
    }
}

/// Lifecycle of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// No pass started yet
    Idle,
    /// Draining a frontier
    Running,
    /// The last pass finished
    Done,
}

/// Counters for one finished pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub label: String,
    /// URLs taken from the frontier
    pub urls_taken: u64,
    /// Pages stored
    pub pages_stored: u64,
    /// Fetches that failed (timeout, transport, non-2xx)
    pub fetch_failures: u64,
    /// Pages whose URL was already stored
    pub duplicates: u64,
    /// Other storage failures
    pub store_errors: u64,
    /// Links that entered the frontier
    pub links_enqueued: u64,
    /// True if `max_pages` stopped the pass with work left
    pub capped: bool,
    pub elapsed: Duration,
}

/// Summary of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: i64,
    pub passes: Vec<PassReport>,
    /// None if the repository collection did not run
    pub repositories_stored: Option<usize>,
}

/// Which parts of a run to execute
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_web: bool,
    pub skip_repos: bool,
}

/// Crawl state for one process run
///
/// Owns the HTTP client, the admission filter and the current pass's
/// frontier, and borrows the storage backend. Each pass gets a fresh
/// frontier, so one pass's dedup set never starves another.
pub struct CrawlSession<'a, S: Storage + ?Sized> {
    client: Client,
    filter: AdmissionFilter,
    storage: &'a mut S,
    frontier: Frontier,
    state: CrawlState,
}

impl<'a, S: Storage + ?Sized> CrawlSession<'a, S> {
    /// Creates an idle session
    pub fn new(client: Client, filter: AdmissionFilter, storage: &'a mut S) -> Self {
        Self {
            client,
            filter,
            storage,
            frontier: Frontier::new(),
            state: CrawlState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// The frontier of the current (or last) pass
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs one pass until its frontier is empty or its page cap is hit
    ///
    /// Per-URL failures are logged and counted; nothing inside a pass aborts
    /// it.
    pub async fn run_pass(&mut self, pass: &CrawlPass) -> PassReport {
        let start_time = Instant::now();
        let mut report = PassReport {
            label: pass.label.clone(),
            ..Default::default()
        };

        self.frontier = Frontier::new();
        self.state = CrawlState::Running;
        tracing::info!("Starting pass '{}' at {}", pass.label, pass.start_url);

        if !self.frontier.seed(&pass.start_url) {
            tracing::warn!("Pass '{}' has no usable start URL", pass.label);
        }

        loop {
            if let Some(cap) = pass.max_pages {
                if report.urls_taken >= u64::from(cap) && !self.frontier.is_empty() {
                    tracing::info!(
                        "Pass '{}' reached its cap of {} pages with {} URLs left",
                        pass.label,
                        cap,
                        self.frontier.len()
                    );
                    report.capped = true;
                    break;
                }
            }

            let url = match self.frontier.take() {
                Some(url) => url,
                None => {
                    tracing::info!("Frontier for '{}' is empty", pass.label);
                    break;
                }
            };

            report.urls_taken += 1;
            self.process_url(&url, &pass.label, &mut report).await;

            if report.urls_taken % PROGRESS_INTERVAL == 0 {
                let rate = report.urls_taken as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress '{}': {} pages taken, {} stored, {} in frontier, {:.2} pages/sec",
                    pass.label,
                    report.urls_taken,
                    report.pages_stored,
                    self.frontier.len(),
                    rate
                );
            }
        }

        report.elapsed = start_time.elapsed();
        self.state = CrawlState::Done;

        tracing::info!(
            "Pass '{}' done: {} stored, {} failed, {} duplicates in {:?}",
            pass.label,
            report.pages_stored,
            report.fetch_failures,
            report.duplicates,
            report.elapsed
        );

        report
    }

    /// Fetches, stores and fans out a single URL
    async fn process_url(&mut self, url: &str, label: &str, report: &mut PassReport) {
        tracing::debug!("Processing URL: {}", url);

        let fetched = match fetch_page(&self.client, url).await {
            Ok(fetched) => fetched,
            Err(failure) => {
                tracing::warn!("Skipping {}", failure);
                report.fetch_failures += 1;
                return;
            }
        };

        if fetched.final_url != url && self.frontier.mark_seen(&fetched.final_url) {
            tracing::debug!("{} redirected to {}", url, fetched.final_url);
        }

        let extraction = extract_fetched(url, &fetched);
        let page = NewPage {
            source: label.to_string(),
            url: url.to_string(),
            title: extraction.title,
            content: extraction.content,
            crawled_at: Utc::now(),
        };

        match self.storage.insert_page(&page) {
            Ok(_) => report.pages_stored += 1,
            Err(StorageError::DuplicateUrl(existing)) => {
                // Within a pass the frontier rules this out; a hit here means
                // an earlier pass or run already stored the page.
                tracing::warn!("{} is already stored; insert skipped", existing);
                report.duplicates += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to store {}: {}", url, e);
                report.store_errors += 1;
            }
        }

        for link in &extraction.links {
            if self.frontier.offer(link, &self.filter) {
                report.links_enqueued += 1;
            }
        }
    }
}

/// Extracts a fetched body, resolving links against the post-redirect URL
fn extract_fetched(url: &str, fetched: &FetchedPage) -> Extraction {
    match Url::parse(&fetched.final_url).or_else(|_| Url::parse(url)) {
        Ok(base) => extract_page(&fetched.body, &base),
        Err(_) => Extraction::default(),
    }
}

/// Runs the complete crawl operation
///
/// 1. Open storage and create the schema (fatal on failure)
/// 2. Record a new run
/// 3. Run every crawl pass in configuration order
/// 4. Collect repositories, if configured
/// 5. Mark the run completed
///
/// # Example
///
/// ```no_run
/// use flare_kb::config::load_config_with_hash;
/// use flare_kb::crawler::{run_crawl, RunOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("flare-kb.toml"))?;
/// let summary = run_crawl(&config, &hash, RunOptions::default()).await?;
/// println!("{} passes", summary.passes.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    options: RunOptions,
) -> Result<RunSummary, KbError> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let client = build_http_client(&config.crawler)?;

    let run_id = storage.create_run(config_hash)?;
    tracing::info!("Starting run {}", run_id);

    let mut summary = RunSummary {
        run_id,
        ..Default::default()
    };

    if options.skip_web {
        tracing::info!("Skipping web crawl passes");
    } else {
        let filter = AdmissionFilter::from_config(&config.admission);
        let mut session = CrawlSession::new(client, filter, &mut storage);
        for pass_config in &config.passes {
            let report = session.run_pass(&CrawlPass::from(pass_config)).await;
            summary.passes.push(report);
        }
    }

    match (&config.repositories, options.skip_repos) {
        (Some(repos), false) => {
            let mut collector = match RepoCollector::from_config(repos, &config.crawler) {
                Ok(collector) => collector,
                Err(e) => {
                    storage.fail_run(run_id)?;
                    return Err(e.into());
                }
            };
            let ids = collector.plan_ids(&repos.ids, repos.discover).await;
            tracing::info!("Collecting {} repositories", ids.len());
            let stored = collector.collect_into(&mut storage, &ids).await;
            summary.repositories_stored = Some(stored);
        }
        (Some(_), true) => tracing::info!("Skipping repository collection"),
        (None, _) => {}
    }

    storage.complete_run(run_id)?;
    tracing::info!("Run {} completed", run_id);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::storage::SqliteStorage;
    use crate::url::AdmissionMode;

    fn test_client() -> Client {
        build_http_client(&CrawlerConfig {
            fetch_timeout_secs: 2,
            user_agent: "flare-kb-test/1.0".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_pass_from_config() {
        let config = PassConfig {
            label: "documentation".to_string(),
            start_url: "https://docs.flare.network/".to_string(),
            max_pages: Some(5),
        };
        let pass = CrawlPass::from(&config);
        assert_eq!(pass.label, "documentation");
        assert_eq!(pass.max_pages, Some(5));
    }

    #[test]
    fn test_session_starts_idle() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let filter = AdmissionFilter::new(AdmissionMode::Suffix, ["flare.network"]);
        let session = CrawlSession::new(test_client(), filter, &mut storage);
        assert_eq!(session.state(), CrawlState::Idle);
        assert!(session.frontier().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_start_url_finishes_pass() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let filter = AdmissionFilter::new(AdmissionMode::Exact, ["127.0.0.1"]);
        let mut session = CrawlSession::new(test_client(), filter, &mut storage);

        let report = session
            .run_pass(&CrawlPass::new("dead", "http://127.0.0.1:9/"))
            .await;

        assert_eq!(session.state(), CrawlState::Done);
        assert_eq!(report.urls_taken, 1);
        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.pages_stored, 0);
        drop(session);
        assert_eq!(storage.count_pages().unwrap(), 0);
    }

    #[test]
    fn test_extract_fetched_uses_final_url() {
        let fetched = FetchedPage {
            final_url: "https://docs.flare.network/intro/".to_string(),
            status_code: 200,
            body: r#"<a href="next">Next</a>"#.to_string(),
        };
        let extraction = extract_fetched("https://docs.flare.network/intro", &fetched);
        assert_eq!(
            extraction.links,
            vec!["https://docs.flare.network/intro/next".to_string()]
        );
    }
}
