use crate::config::types::{Config, CrawlerConfig, DelayConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_source_config(&config.source)?;
    validate_delay_config(&config.delays)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl range and retry settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_id < 1 {
        return Err(ConfigError::Validation(
            "start-id must be a positive identifier".to_string(),
        ));
    }

    if config.start_id > config.end_id {
        return Err(ConfigError::Validation(format!(
            "start-id must not exceed end-id, got {} > {}",
            config.start_id, config.end_id
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    // Accepted but never used for parallelism; requests stay sequential
    if config.max_workers < 1 {
        return Err(ConfigError::Validation(
            "max-workers must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the document repository settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates every pause range
fn validate_delay_config(config: &DelayConfig) -> Result<(), ConfigError> {
    let ranges = [
        ("request", config.request_min, config.request_max),
        ("rate-limit", config.rate_limit_min, config.rate_limit_max),
        ("nap", config.nap_min, config.nap_max),
        ("retry-nap", config.retry_nap_min, config.retry_nap_max),
        ("batch-break", config.batch_break_min, config.batch_break_max),
    ];

    for (name, min, max) in ranges {
        if min < 0.0 || max < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} delay range must be non-negative, got {}..{}",
                name, min, max
            )));
        }
        if min > max {
            return Err(ConfigError::Validation(format!(
                "{} delay range is inverted, got {}..{}",
                name, min, max
            )));
        }
    }

    if config.batch_cooldown < 0.0 {
        return Err(ConfigError::Validation(format!(
            "batch-cooldown must be non-negative, got {}",
            config.batch_cooldown
        )));
    }

    if !(0.0..=1.0).contains(&config.nap_chance) {
        return Err(ConfigError::Validation(format!(
            "nap-chance must be a probability in [0, 1], got {}",
            config.nap_chance
        )));
    }

    Ok(())
}

/// Validates the output and state file paths
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.corpus_path.is_empty() {
        return Err(ConfigError::Validation(
            "corpus-path cannot be empty".to_string(),
        ));
    }

    if config.processed_path.is_empty() || config.failed_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger paths cannot be empty".to_string(),
        ));
    }

    // The ledger owns both files; sharing one path would interleave the sets
    if config.processed_path == config.failed_path {
        return Err(ConfigError::Validation(
            "processed-path and failed-path must be distinct files".to_string(),
        ));
    }

    Ok(())
}
