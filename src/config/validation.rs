use crate::config::types::{
    AdmissionConfig, Config, CrawlerConfig, OutputConfig, PassConfig, RepositoriesConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_admission_config(&config.admission)?;
    validate_output_config(&config.output)?;
    validate_passes(&config.passes)?;
    if let Some(repos) = &config.repositories {
        validate_repositories_config(repos)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and 300, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the admission policy
fn validate_admission_config(config: &AdmissionConfig) -> Result<(), ConfigError> {
    if config.hosts.is_empty() {
        return Err(ConfigError::Validation(
            "admission.hosts must list at least one host".to_string(),
        ));
    }

    for host in &config.hosts {
        validate_domain_string(host)?;
    }

    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must start with '.' followed by at least one character",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl pass entries
fn validate_passes(passes: &[PassConfig]) -> Result<(), ConfigError> {
    let mut labels = HashSet::new();

    for pass in passes {
        if pass.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pass label cannot be empty".to_string(),
            ));
        }

        if !labels.insert(pass.label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate pass label '{}'",
                pass.label
            )));
        }

        let url = Url::parse(&pass.start_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", pass.start_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Start URL '{}' must use HTTP or HTTPS",
                pass.start_url
            )));
        }

        if pass.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "max_pages for pass '{}' must be >= 1 when set",
                pass.label
            )));
        }
    }

    Ok(())
}

/// Validates repository collection settings
fn validate_repositories_config(config: &RepositoriesConfig) -> Result<(), ConfigError> {
    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    validate_identifier("owner", &config.owner)?;
    for id in &config.ids {
        validate_identifier("repository id", id)?;
    }

    if config.ids.is_empty() && !config.discover {
        return Err(ConfigError::Validation(
            "repositories.ids is empty and discover is off; nothing to collect".to_string(),
        ));
    }

    if let Some(var) = &config.token_env {
        if var.is_empty() {
            return Err(ConfigError::Validation(
                "token_env cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Repository owners and names: alphanumerics, '-', '_', '.'
fn validate_identifier(kind: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "invalid {} '{}'",
            kind, value
        )));
    }
    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
