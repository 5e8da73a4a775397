use crate::config::types::{Config, CrawlConfig, OutputConfig, SourceConfig, UserAgentConfig};
use crate::crawler::CrawlMode;
use crate::ConfigError;
use chrono::NaiveDate;
use url::Url;

/// Upper bound on the worker pool
pub const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    if let Some(login) = &config.login {
        validate_url("login url", &login.url)?;
        if login.name.is_empty() {
            return Err(ConfigError::Validation(
                "login name cannot be empty".to_string(),
            ));
        }
    }
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates the endpoint configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_url("source url", &config.url)?;

    if let Some(params) = &config.further_params {
        if !params.is_empty() && !params.starts_with('&') {
            return Err(ConfigError::Validation(format!(
                "further_params must start with '&', got '{}'",
                params
            )));
        }
    }

    if config.page_size == 0 {
        return Err(ConfigError::Validation(
            "page_size must be >= 1".to_string(),
        ));
    }

    if config.start_point_increase == 0 {
        return Err(ConfigError::Validation(
            "start_point_increase must be >= 1".to_string(),
        ));
    }

    if let Some(before) = &config.before {
        validate_date(before)?;
    }
    if let Some(after) = &config.after {
        validate_date(after)?;
    }

    Ok(())
}

/// Validates mode and worker settings
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    config
        .mode
        .parse::<CrawlMode>()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates sink settings
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.separator.is_empty() {
        return Err(ConfigError::Validation(
            "separator cannot be empty".to_string(),
        ));
    }

    if config.commit_buckets == 0 {
        return Err(ConfigError::Validation(
            "commit_buckets must be >= 1".to_string(),
        ));
    }

    if let Some(folder) = &config.folder {
        if folder.as_os_str().is_empty() {
            return Err(ConfigError::Validation("folder cannot be empty".to_string()));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates an absolute http(s) URL
fn validate_url(label: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, value
        )));
    }

    Ok(())
}

/// Validates a query date in yyyy-mm-dd form
fn validate_date(value: &str) -> Result<(), ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidDate(format!("'{}' is not yyyy-mm-dd: {}", value, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2020-01-31").is_ok());
        assert!(validate_date("2020-02-30").is_err());
        assert!(validate_date("31.01.2020").is_err());
        assert!(validate_date("").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("x", "https://bugzilla.example.org/rest/").is_ok());
        assert!(validate_url("x", "http://127.0.0.1:8080/changes").is_ok());
        assert!(validate_url("x", "ftp://example.org").is_err());
        assert!(validate_url("x", "not a url").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_crawl_config_rejects_zero_workers() {
        let config = CrawlConfig {
            mode: "parallel-both".to_string(),
            workers: 0,
            unit_list: None,
            units: None,
        };
        assert!(validate_crawl_config(&config).is_err());
    }

    #[test]
    fn test_crawl_config_rejects_unknown_mode() {
        let config = CrawlConfig {
            mode: "sideways".to_string(),
            workers: 4,
            unit_list: None,
            units: None,
        };
        assert!(matches!(
            validate_crawl_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
