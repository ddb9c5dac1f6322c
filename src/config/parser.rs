use crate::config::types::{Config, ProxyCredentials};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment names holding the proxy credentials
pub const PROXY_ENV_VARS: [&str; 4] = ["PROXY_USER", "PROXY_PASSWORD", "PROXY_HOST", "PROXY_PORT"];

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Site: {}", config.site.id);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with the final table so a result set can be traced
/// back to the configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads proxy credentials through `lookup`
///
/// Every one of `PROXY_USER`, `PROXY_PASSWORD`, `PROXY_HOST` and `PROXY_PORT`
/// must be present and non-empty, and the port must be a valid u16.
pub fn load_proxy_credentials<F>(lookup: F) -> Result<ProxyCredentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
    };

    let [user_var, password_var, host_var, port_var] = PROXY_ENV_VARS;
    let user = read(user_var)?;
    let password = read(password_var)?;
    let host = read(host_var)?;
    let port = read(port_var)?;
    let port = port.parse::<u16>().map_err(|_| {
        ConfigError::Validation(format!("{} must be a port number, got '{}'", port_var, port))
    })?;

    Ok(ProxyCredentials {
        user,
        password,
        host,
        port,
    })
}

/// Reads proxy credentials from the process environment
///
/// Returns `Ok(None)` when the configuration does not require a proxy and
/// none is configured.
pub fn proxy_from_env(config: &Config) -> Result<Option<ProxyCredentials>, ConfigError> {
    match load_proxy_credentials(|name| std::env::var(name).ok()) {
        Ok(credentials) => Ok(Some(credentials)),
        Err(e) if config.session.require_proxy => Err(e),
        Err(ConfigError::MissingEnv(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
