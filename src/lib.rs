//! flare-kb: an organization knowledge-base crawler
//!
//! This crate crawls a bounded set of web domains, extracts page text and
//! metadata, pulls repository READMEs from a code-hosting API, and stores
//! everything in a SQLite database with a full-text index.

pub mod config;
pub mod crawler;
pub mod output;
pub mod repos;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum KbError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for flare-kb operations
pub type Result<T> = std::result::Result<T, KbError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSession, Frontier};
pub use repos::{RepoCollector, RepositoryRecord};
pub use storage::{SqliteStorage, Storage};
pub use url::{normalize_url, AdmissionFilter, AdmissionMode};
