//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading proxy credentials from the environment.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting with {} workers per shard", config.pool.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffKind, Config, HarvestConfig, OutputConfig, PoolConfig, ProxyCredentials,
    SessionSettings, SiteConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_proxy_credentials,
    parse_config, proxy_from_env, PROXY_ENV_VARS,
};
