use crate::config::types::{Config, CrawlSettings, RendererConfig, SchedulerConfig, Source};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

/// Validates crawl settings
pub fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.max_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be >= 1, got {}",
            settings.max_depth
        )));
    }

    if settings.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if settings.min_text_length == 0 {
        return Err(ConfigError::Validation(
            "min_text_length must be >= 1".to_string(),
        ));
    }

    for extension in &settings.ignored_extensions {
        if !extension.starts_with('.') || extension.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "ignored extension '{}' must start with a dot",
                extension
            )));
        }
    }

    for segment in &settings.ignored_path_segments {
        if segment.is_empty() || segment.contains('/') {
            return Err(ConfigError::Validation(format!(
                "ignored path segment '{}' must be a single non-empty segment",
                segment
            )));
        }
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.page_load_timeout == 0 {
        return Err(ConfigError::Validation(
            "page_load_timeout must be >= 1 second".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.poll_interval_seconds == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a list of registered sources
pub fn validate_sources(sources: &[Source]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for source in sources {
        validate_source_url(&source.url)?;

        if !seen.insert(source.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "source '{}' is registered more than once",
                source.url
            )));
        }
    }

    Ok(())
}

/// Validates that a source URL is an absolute http(s) URL with a host
pub fn validate_source_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid source URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source URL '{}' must use http or https",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Source URL '{}' has no host",
            raw
        )));
    }

    Ok(())
}
