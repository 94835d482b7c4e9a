//! Configuration module for flare-kb
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use flare_kb::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("flare-kb.toml")).unwrap();
//! println!("Crawl passes: {}", config.passes.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AdmissionConfig, Config, CrawlerConfig, OutputConfig, PassConfig, RepositoriesConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

pub(crate) use types::default_excluded_extensions;
