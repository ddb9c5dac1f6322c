//! Fetch sessions and the HTTP fetcher
//!
//! This module defines the network boundary of the harvester:
//! - `Fetcher`: opens isolated sessions, one per harvest job
//! - `Session`: navigates to pages and resolves secondary navigations
//! - `HttpFetcher`: the reqwest-backed implementation
//!
//! Sessions make a single attempt per call. Retrying is the harvester's job.

use crate::config::{Config, ProxyCredentials};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// A fully loaded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Final URL after redirects
    pub url: String,

    /// Page markup
    pub body: String,
}

/// Explicit session settings handed to a Fetcher at construction
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,

    /// Client-side bound on one request
    pub timeout: Duration,

    /// Wait after each navigation before the page is read
    pub settle: Duration,

    pub proxy: Option<ProxyCredentials>,
}

impl SessionConfig {
    /// Builds session settings from the run configuration
    pub fn from_config(config: &Config, proxy: Option<ProxyCredentials>) -> Self {
        Self {
            user_agent: config.session.user_agent.clone(),
            timeout: Duration::from_millis(config.harvest.fetch_timeout_ms),
            settle: Duration::from_millis(config.harvest.settle_ms),
            proxy,
        }
    }
}

/// One isolated browsing session
#[async_trait]
pub trait Session: Send {
    /// Navigates to `url` and returns the settled page
    async fn open(&mut self, url: &str) -> Result<RenderedPage, FetchError>;

    /// Follows a secondary navigation and returns the address it lands on
    async fn resolve_destination(&mut self, url: &str) -> Result<String, FetchError>;

    /// Waits for the last opened page to settle
    ///
    /// Runs after a successful `open`, outside the attempt timeout.
    async fn settle(&mut self) {}
}

/// Factory for isolated sessions
pub trait Fetcher: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn Session>, FetchError>;
}

/// Builds an HTTP client with the session's identity and proxy
///
/// # Arguments
///
/// * `config` - The session configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. malformed proxy)
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout)
        .connect_timeout(config.timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        // Credentials go through basic auth so reserved characters need no escaping
        let proxy_server =
            reqwest::Proxy::all(proxy.endpoint())?.basic_auth(&proxy.user, &proxy.password);
        builder = builder.proxy(proxy_server);
    }

    builder.build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    config: SessionConfig,
}

impl HttpFetcher {
    /// Creates a fetcher, verifying that a client can be built from `config`
    pub fn new(config: SessionConfig) -> Result<Self, reqwest::Error> {
        build_http_client(&config)?;
        Ok(Self { config })
    }
}

impl Fetcher for HttpFetcher {
    fn open_session(&self) -> Result<Box<dyn Session>, FetchError> {
        let client = build_http_client(&self.config).map_err(|e| FetchError::Connection {
            url: String::new(),
            message: format!("failed to build client: {}", e),
        })?;

        Ok(Box::new(HttpSession {
            client,
            settle: self.config.settle,
        }))
    }
}

/// A session with its own connection pool
pub struct HttpSession {
    client: Client,
    settle: Duration,
}

#[async_trait]
impl Session for HttpSession {
    async fn open(&mut self, url: &str) -> Result<RenderedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        check_status(url, status)?;

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(RenderedPage {
            url: final_url,
            body,
        })
    }

    async fn resolve_destination(&mut self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        check_status(url, response.status())?;
        Ok(response.url().to_string())
    }

    async fn settle(&mut self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}

/// Maps a response status to a fetch error
///
/// | Status | Error |
/// |--------|-------|
/// | 2xx | none |
/// | 403, 429 | Blocked |
/// | anything else | Connection |
fn check_status(url: &str, status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::Blocked {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Err(FetchError::Connection {
        url: url.to_string(),
        message: format!("HTTP {}", status.as_u16()),
    })
}

/// Classifies a transport error
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
