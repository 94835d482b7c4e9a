//! Secondary source: repository metadata and READMEs from a code-hosting API
//!
//! This module speaks the GitHub REST v3 shape:
//! - `GET {api}/repos/{owner}/{id}` for name and description
//! - `GET {api}/repos/{owner}/{id}/readme` for base64 README content
//! - `GET {api}/orgs/{owner}/repos?per_page=..&page=..` for discovery
//!
//! Calls are strictly sequential and paced by [`Pacer`].

mod collector;
mod pacer;

pub use collector::{decode_readme, RepoCollector, RepoError};
pub use pacer::Pacer;

/// Stored when the README endpoint fails or returns an unusable payload
pub const README_FETCH_FAILED: &str = "Failed to fetch README";

/// Stored when the README endpoint succeeds but carries no content
pub const README_MISSING: &str = "No README found";

/// Stored when repository metadata has no name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Stored when repository metadata has no description
pub const NO_DESCRIPTION: &str = "No description";

/// One collected repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub description: String,
    pub readme: String,
}
