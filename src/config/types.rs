use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub session: SessionSettings,
    pub output: OutputConfig,
}

/// Which directory site to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site identifier (getapp, g2, capterra, shi)
    pub id: String,

    /// Maximum taxonomy depth; leaf chains are padded to this length
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: usize,

    /// Overrides the site's category index URL
    #[serde(rename = "root-url", default)]
    pub root_url: Option<String>,
}

/// Per-category harvest behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Fetch attempts per page before the page is abandoned
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Upper bound on a single fetch attempt (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Wait after each navigation before the page is read (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Follow "visit website" targets to record the vendor's own address
    #[serde(rename = "resolve-vendor-links", default)]
    pub resolve_vendor_links: bool,
}

/// Delay growth between retry attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Number of shards the leaf list is split into
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Concurrent jobs per shard
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Fetch session settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Fail before any network activity when proxy credentials are absent
    #[serde(rename = "require-proxy", default = "default_require_proxy")]
    pub require_proxy: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding checkpoints and the final table
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Proxy credentials read from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl ProxyCredentials {
    /// Proxy endpoint in `http://host:port` form, without credentials
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: BackoffKind::default(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            settle_ms: default_settle_ms(),
            resolve_vendor_links: false,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            workers: default_workers(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            require_proxy: default_require_proxy(),
        }
    }
}

fn default_max_depth() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_settle_ms() -> u64 {
    3_000
}

fn default_shards() -> usize {
    5
}

fn default_workers() -> usize {
    4
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36".to_string()
}

fn default_require_proxy() -> bool {
    true
}
