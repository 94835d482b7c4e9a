//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::repos::RepositoryRecord;
use crate::storage::{NewPage, PageRecord, RepositoryHit, RunRecord, SearchHit};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate URL: {0}")]
    DuplicateUrl(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler and the
/// repository collector. Every write that touches a full-text index is a
/// single call: implementations keep the primary row and its index row in
/// one transaction.
pub trait Storage {
    // ===== Schema =====

    /// Ensures all tables and indexes exist; safe to call repeatedly
    fn create_schema(&mut self) -> StorageResult<()>;

    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Marks a run as failed with a finish timestamp
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Pages =====

    /// Inserts a page and its full-text index row
    ///
    /// Fails with [`StorageError::DuplicateUrl`] if the URL is already
    /// stored, in which case neither row is written.
    fn insert_page(&mut self, page: &NewPage) -> StorageResult<i64>;

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Counts all stored pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Counts pages per source label, sorted by label
    fn count_pages_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Repositories =====

    /// Appends a repository record and its full-text index row
    fn insert_repository(&mut self, record: &RepositoryRecord) -> StorageResult<i64>;

    /// Counts stored repository records
    fn count_repositories(&self) -> StorageResult<u64>;

    // ===== Search =====

    /// Full-text search over page title and content
    ///
    /// Supports plain terms (all must match) and double-quoted phrases.
    /// Returns hits in relevance order; an empty vector when nothing matches.
    fn search(&self, query: &str) -> StorageResult<Vec<SearchHit>>;

    /// Full-text search over repository name, description and README
    fn search_repositories(&self, query: &str) -> StorageResult<Vec<RepositoryHit>>;
}
