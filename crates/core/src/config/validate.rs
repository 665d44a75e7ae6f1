use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Service URLs are http(s)
/// - Page size, page cap and cache TTL are within range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    for (key, url) in [
        ("server.public_url", &config.server.public_url),
        ("mediathek.url", &config.mediathek.url),
        ("rulesets.url", &config.rulesets.url),
        ("episodes.url", &config.episodes.url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got '{}'",
                key, url
            )));
        }
    }

    if config.mediathek.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "mediathek.page_size cannot be 0".to_string(),
        ));
    }

    if config.rulesets.max_pages == 0 || config.rulesets.max_pages > 99 {
        return Err(ConfigError::ValidationError(
            "rulesets.max_pages must be between 1 and 99".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
