//! Catalog-Harvest: a software-directory listing harvester
//!
//! This crate resolves a directory site's nested category tree down to the leaf
//! categories that list products, then harvests every paginated listing page
//! under each leaf with bounded retries, a sharded worker pool, and
//! deterministic aggregation.

pub mod category;
pub mod config;
pub mod harvest;
pub mod output;
pub mod sites;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Category resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] sites::ParseError),

    #[error("Sink error: {0}")]
    Sink(#[from] storage::SinkError),
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

    #[error("Unknown site identifier: {0}")]
    UnknownSite(String),

    #[error("Missing required environment value: {0}")]
    MissingEnv(String),
}

/// Errors raised by a Fetcher for a single navigation attempt
///
/// Every variant is retry-eligible; the harvester owns the retry policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Blocked by {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },
}

/// Malformed category snapshots; always fatal for the run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Cyclic parent reference at '{name}'")]
    Cycle { name: String },

    #[error("Malformed category node '{name}': {message}")]
    Malformed { name: String, message: String },

    #[error("Category '{path}' references a parent that is not in the snapshot")]
    Orphan { path: String },

    #[error("Category '{name}' is at level {level}, beyond max depth {max_depth}")]
    LevelOutOfRange {
        name: String,
        level: usize,
        max_depth: usize,
    },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use category::{CategoryNode, LeafCategory};
pub use config::Config;
pub use state::{JobStatus, ListingRecord, PartialBatch};
