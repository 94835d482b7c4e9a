//! Crawl frontier: FIFO queue plus the set of every URL ever queued
//!
//! One frontier serves exactly one crawl pass. The seen set only grows, so a
//! URL is handed out by [`Frontier::take`] at most once per pass no matter
//! how many pages link to it.

use crate::url::{normalize_url, AdmissionFilter};
use std::collections::{HashSet, VecDeque};

/// Pending URLs and the dedup set for one crawl pass
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, oldest first
    queue: VecDeque<String>,

    /// Every URL ever placed in `queue`
    seen: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a trusted start URL without consulting the admission filter
    ///
    /// Returns false if the URL is malformed or was already queued.
    pub fn seed(&mut self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.push_unseen(normalized.into()),
            Err(e) => {
                tracing::warn!("Ignoring malformed start URL {}: {}", url, e);
                false
            }
        }
    }

    /// Queues a discovered URL iff it is admissible and not seen before
    ///
    /// The admission check runs before the dedup set is touched, so rejected
    /// URLs are never recorded as seen. Returns true if the URL was queued.
    pub fn offer(&mut self, url: &str, filter: &AdmissionFilter) -> bool {
        let normalized = match normalize_url(url) {
            Ok(n) => n,
            Err(_) => return false,
        };

        if !filter.admits(&normalized) {
            return false;
        }

        self.push_unseen(normalized.into())
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for the landing URL of a redirect, whose content was already
    /// stored under the requested URL. Returns true if the URL was new.
    pub fn mark_seen(&mut self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.seen.insert(normalized.into()),
            Err(_) => false,
        }
    }

    /// Removes and returns the oldest pending URL, or None when drained
    pub fn take(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Number of URLs still pending
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no work remains
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of URLs ever queued
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// True if the URL has ever been queued in this frontier
    pub fn has_seen(&self, url: &str) -> bool {
        normalize_url(url)
            .map(|n| self.seen.contains(n.as_str()))
            .unwrap_or(false)
    }

    fn push_unseen(&mut self, url: String) -> bool {
        // insert() is the check-and-set: false means already seen
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }
}
