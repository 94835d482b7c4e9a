use crate::url::AdmissionMode;
use serde::Deserialize;

/// Main configuration structure for flare-kb
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub admission: AdmissionConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "pass")]
    pub passes: Vec<PassConfig>,
    #[serde(default)]
    pub repositories: Option<RepositoriesConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Per-request timeout for page fetches (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Which discovered URLs may be crawled
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    /// Host matching policy
    pub mode: AdmissionMode,

    /// Hosts (exact mode) or host suffixes (suffix mode)
    pub hosts: Vec<String>,

    /// Path extensions that are never fetched
    #[serde(rename = "excluded-extensions", default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A named crawl pass over one site section
#[derive(Debug, Clone, Deserialize)]
pub struct PassConfig {
    /// Source label stored with every page of this pass
    pub label: String,

    /// Trusted start URL
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Optional cap on pages fetched by this pass
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

/// Repository-hosting API collection settings
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoriesConfig {
    /// API root, e.g. `https://api.github.com`
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Organization or user that owns the repositories
    pub owner: String,

    /// Repository identifiers to collect
    #[serde(default)]
    pub ids: Vec<String>,

    /// Minimum time between successive API calls (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Environment variable holding an API token
    #[serde(rename = "token-env", default)]
    pub token_env: Option<String>,

    /// Also enumerate every repository of the owner organization
    #[serde(default)]
    pub discover: bool,
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("flare-kb/{}", env!("CARGO_PKG_VERSION"))
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_excluded_extensions() -> Vec<String> {
    [".css", ".js", ".jpg", ".jpeg", ".png", ".gif", ".pdf"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}
