use crate::config::types::{Config, HarvestConfig, OutputConfig, PoolConfig, SessionSettings, SiteConfig};
use crate::sites::SiteId;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_harvest_config(&config.harvest)?;
    validate_pool_config(&config.pool)?;
    validate_session_settings(&config.session)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site selection
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if SiteId::parse(&config.id).is_none() {
        return Err(ConfigError::UnknownSite(config.id.clone()));
    }

    if config.max_depth < 1 || config.max_depth > 8 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 1 and 8, got {}",
            config.max_depth
        )));
    }

    if let Some(root_url) = &config.root_url {
        let url = Url::parse(root_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root_url '{}': {}", root_url, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "root_url '{}' must use HTTP(S)",
                root_url
            )));
        }
    }

    Ok(())
}

/// Validates retry and timing settings
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    Ok(())
}

/// Validates worker pool sizing
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.shards < 1 {
        return Err(ConfigError::Validation(format!(
            "shards must be >= 1, got {}",
            config.shards
        )));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    Ok(())
}

/// Validates session settings
fn validate_session_settings(config: &SessionSettings) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
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

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
