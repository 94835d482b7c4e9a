use crate::config::{CrawlerConfig, RepositoriesConfig};
use crate::repos::{
    Pacer, RepositoryRecord, NO_DESCRIPTION, README_FETCH_FAILED, README_MISSING, UNKNOWN_NAME,
};
use crate::storage::Storage;
use base64::Engine;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Page size requested when enumerating an organization
const DISCOVERY_PAGE_SIZE: usize = 100;

/// Upper bound on discovery pages, in case a server ignores `page`
const MAX_DISCOVERY_PAGES: u32 = 50;

/// Errors from a single repository API call
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("cannot decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Repository metadata fields we keep
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    name: Option<String>,
    description: Option<String>,
}

/// README endpoint payload
#[derive(Debug, Deserialize)]
struct ReadmePayload {
    content: Option<String>,
}

/// Collects repository records one API call at a time
pub struct RepoCollector {
    client: Client,
    api_base: String,
    owner: String,
    token: Option<String>,
    pacer: Pacer,
}

impl RepoCollector {
    /// Creates a collector for `owner`'s repositories under `api_base`
    pub fn new(client: Client, api_base: &str, owner: &str, delay: Duration) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            token: None,
            pacer: Pacer::new(delay),
        }
    }

    /// Sends `Authorization: Bearer <token>` with every call
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Builds a collector from the `[repositories]` section
    ///
    /// The token, if configured, is read from the named environment variable;
    /// an unset variable falls back to unauthenticated calls.
    pub fn from_config(
        repos: &RepositoriesConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crawler.user_agent.as_str())
            .timeout(Duration::from_secs(crawler.fetch_timeout_secs))
            .build()?;

        let token = repos.token_env.as_deref().and_then(|var| match std::env::var(var) {
            Ok(token) if !token.is_empty() => Some(token),
            _ => {
                tracing::warn!("{} is not set; repository API calls are unauthenticated", var);
                None
            }
        });

        Ok(Self::new(
            client,
            &repos.api_base,
            &repos.owner,
            Duration::from_millis(repos.delay_ms),
        )
        .with_token(token))
    }

    /// Collects one record per identifier, in order
    ///
    /// A repository whose metadata cannot be fetched or decoded is logged and
    /// skipped. README problems never skip a repository; they produce a
    /// sentinel readme instead.
    pub async fn collect(&mut self, ids: &[String]) -> Vec<RepositoryRecord> {
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            match self.collect_one(id).await {
                Ok(record) => {
                    tracing::debug!("Collected repository {}", record.name);
                    records.push(record);
                }
                Err(e) => tracing::warn!("Skipping repository {}: {}", id, e),
            }
        }

        tracing::info!(
            "Collected {} of {} repositories",
            records.len(),
            ids.len()
        );
        records
    }

    /// Collects and stores records, returning how many were stored
    pub async fn collect_into<S: Storage + ?Sized>(
        &mut self,
        storage: &mut S,
        ids: &[String],
    ) -> usize {
        let mut stored = 0;
        for record in self.collect(ids).await {
            match storage.insert_repository(&record) {
                Ok(_) => stored += 1,
                Err(e) => tracing::warn!("Failed to store repository {}: {}", record.name, e),
            }
        }
        stored
    }

    /// Lists every repository name of the owner organization
    ///
    /// Pages through the listing until a short or empty page.
    pub async fn list_organization_repos(&mut self) -> Result<Vec<String>, RepoError> {
        let mut names = Vec::new();

        for page in 1..=MAX_DISCOVERY_PAGES {
            let url = format!(
                "{}/orgs/{}/repos?per_page={}&page={}",
                self.api_base, self.owner, DISCOVERY_PAGE_SIZE, page
            );
            let body = self.get(&url).await?;
            let batch: Vec<RepoMetadata> = serde_json::from_str(&body).map_err(|e| {
                RepoError::Decode {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            })?;

            let count = batch.len();
            names.extend(batch.into_iter().filter_map(|repo| repo.name));

            if count < DISCOVERY_PAGE_SIZE {
                break;
            }
        }

        tracing::info!("Discovered {} repositories for {}", names.len(), self.owner);
        Ok(names)
    }

    /// Configured ids followed by discovered ones, without duplicates
    pub async fn plan_ids(&mut self, configured: &[String], discover: bool) -> Vec<String> {
        let mut ids = configured.to_vec();

        if discover {
            match self.list_organization_repos().await {
                Ok(discovered) => ids.extend(discovered),
                Err(e) => tracing::warn!("Repository discovery failed: {}", e),
            }
        }

        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        ids
    }

    async fn collect_one(&mut self, id: &str) -> Result<RepositoryRecord, RepoError> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, id);
        let body = self.get(&url).await?;
        let metadata: RepoMetadata =
            serde_json::from_str(&body).map_err(|e| RepoError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let readme = self.fetch_readme(id).await;

        Ok(RepositoryRecord {
            name: metadata.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            description: metadata
                .description
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            readme,
        })
    }

    async fn fetch_readme(&mut self, id: &str) -> String {
        let url = format!("{}/repos/{}/{}/readme", self.api_base, self.owner, id);

        let decoded = match self.get(&url).await {
            Ok(body) => decode_readme(&body).map_err(|reason| RepoError::Decode {
                url: url.clone(),
                reason,
            }),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(Some(text)) => text,
            Ok(None) => README_MISSING.to_string(),
            Err(e) => {
                tracing::warn!("README for {}: {}", id, e);
                README_FETCH_FAILED.to_string()
            }
        }
    }

    /// One paced GET returning the body of a 2xx response
    async fn get(&mut self, url: &str) -> Result<String, RepoError> {
        self.pacer.wait().await;
        tracing::debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| RepoError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| RepoError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Decodes a README payload
///
/// Returns `Ok(None)` when the payload has no `content` field. The base64
/// text may contain line breaks; invalid UTF-8 is replaced, not rejected.
///
/// # Example
///
/// ```
/// use flare_kb::repos::decode_readme;
///
/// let body = r#"{"content": "IyBn\nby1mbGFyZQo=", "encoding": "base64"}"#;
/// assert_eq!(decode_readme(body).unwrap().as_deref(), Some("# go-flare\n"));
/// assert_eq!(decode_readme("{}").unwrap(), None);
/// assert!(decode_readme("not json").is_err());
/// ```
pub fn decode_readme(body: &str) -> Result<Option<String>, String> {
    let payload: ReadmePayload = serde_json::from_str(body).map_err(|e| e.to_string())?;

    let content = match payload.content {
        Some(content) => content,
        None => return Ok(None),
    };

    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| e.to_string())?;

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_readme_with_line_breaks() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("# Flare Systems\n\nClients.");
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        let body = serde_json::json!({ "content": wrapped, "encoding": "base64" }).to_string();

        assert_eq!(
            decode_readme(&body).unwrap().as_deref(),
            Some("# Flare Systems\n\nClients.")
        );
    }

    #[test]
    fn test_decode_readme_missing_content() {
        assert_eq!(decode_readme(r#"{"name": "README.md"}"#).unwrap(), None);
    }

    #[test]
    fn test_decode_readme_bad_base64() {
        assert!(decode_readme(r#"{"content": "!!!not-base64!!!"}"#).is_err());
    }

    #[test]
    fn test_decode_readme_invalid_utf8_is_lossy() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([b'o', b'k', 0xff]);
        let body = serde_json::json!({ "content": encoded }).to_string();
        let text = decode_readme(&body).unwrap().unwrap();
        assert!(text.starts_with("ok"));
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let collector = RepoCollector::new(
            Client::new(),
            "https://api.github.com/",
            "flare-foundation",
            Duration::ZERO,
        );
        assert_eq!(collector.api_base, "https://api.github.com");
    }

    #[test]
    fn test_from_config_without_token_env() {
        let repos = RepositoriesConfig {
            api_base: "https://api.github.com".to_string(),
            owner: "flare-foundation".to_string(),
            ids: vec!["go-flare".to_string()],
            delay_ms: 1000,
            token_env: None,
            discover: false,
        };
        let crawler = CrawlerConfig {
            fetch_timeout_secs: 10,
            user_agent: "flare-kb-test/1.0".to_string(),
        };
        let collector = RepoCollector::from_config(&repos, &crawler).unwrap();
        assert!(collector.token.is_none());
        assert_eq!(collector.pacer.min_interval(), Duration::from_secs(1));
    }
}
