//! Storage module for persisting crawl data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Page persistence with a mirrored full-text index
//! - Repository record persistence
//! - Full-text search over pages and repositories
//! - Run tracking

mod query;
mod schema;
mod sqlite;
mod traits;

pub use query::{build_fts5_query, escape_fts5_term};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens storage at `path`, creating the file and schema as needed
///
/// Failure here is the one storage error that aborts a whole run, and it
/// happens before any crawling starts.
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A page about to be stored
#[derive(Debug, Clone)]
pub struct NewPage {
    /// Label of the crawl pass that fetched the page
    pub source: String,
    pub url: String,
    /// Possibly empty
    pub title: String,
    /// Flattened visible text
    pub content: String,
    pub crawled_at: DateTime<Utc>,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub crawled_at: String,
}

/// A page matched by a full-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

/// A repository matched by a full-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHit {
    pub name: String,
    pub description: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
