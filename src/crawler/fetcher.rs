//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - The optional login POST that sets session cookies
//! - GET requests returning the raw response body
//! - Error classification into transport failures

use crate::config::{LoginConfig, UserAgentConfig};
use crate::{Result, TrawlError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// The transport seam: fetch a URL and return its raw body
///
/// Implementations are cloned into every worker; each clone is that worker's
/// session.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url` and returns the response body as text
    ///
    /// # Errors
    ///
    /// `TrawlError::Transport` when the request fails or the server errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Builds an HTTP client with proper configuration
///
/// The cookie store is enabled so that a login performed once keeps the
/// session for every later request made through the same client.
///
/// # Example
///
/// ```no_run
/// use issue_trawler::config::UserAgentConfig;
/// use issue_trawler::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "IssueTrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> std::result::Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactEmail)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the user agent config
    pub fn from_config(config: &UserAgentConfig) -> Result<Self> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Posts the Bugzilla login form once; the session cookies stay in the client
    pub async fn login(&self, login: &LoginConfig) -> Result<()> {
        tracing::info!("Logging in as {} at {}", login.name, login.url);

        let response = self
            .client
            .post(&login.url)
            .form(&[
                ("Bugzilla_login", login.name.as_str()),
                ("Bugzilla_password", login.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| classify_error(&login.url, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TrawlError::Transport {
                url: login.url.clone(),
                message: format!("login rejected with HTTP {}", status.as_u16()),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        // 4xx bodies carry protocol diagnostics (e.g. Gerrit's account
        // disambiguation message) and are handed to the caller as-is.
        let status = response.status();
        if status.is_server_error() {
            return Err(TrawlError::Transport {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Classifies a reqwest failure into a transport error
fn classify_error(url: &str, error: reqwest::Error) -> TrawlError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    TrawlError::Transport {
        url: url.to_string(),
        message,
    }
}
