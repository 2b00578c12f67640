use crate::classifier::ProductClassifier;
use crate::config::settings::{MAX_CONCURRENCY, MIN_TIMEOUT};
use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, FetcherConfig, OutputConfig, SiteEntry,
    UserAgentConfig,
};
use crate::url::Domain;
use crate::ConfigError;
use url::Url;

/// Most retries the fetcher may be configured with
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_classifier_config(&config.classifier)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_products < 1 {
        return Err(ConfigError::Validation(format!(
            "max_products must be >= 1, got {}",
            config.max_products
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if (config.timeout_ms as u128) < MIN_TIMEOUT.as_millis() {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= {}ms, got {}ms",
            MIN_TIMEOUT.as_millis(),
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the retry policy
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }
    Ok(())
}

/// Validates classifier rules by compiling them
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    ProductClassifier::from_config(config).map(|_| ())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    for site in sites {
        Domain::parse(&site.domain).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site domain '{}': {}", site.domain, e))
        })?;
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler(max_products: usize, concurrency: usize, timeout_ms: u64) -> CrawlerConfig {
        CrawlerConfig {
            max_products,
            concurrency,
            timeout_ms,
            sitemap_fallback: true,
            inspect_pages: false,
        }
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&crawler(100, 4, 10_000)).is_ok());
        assert!(validate_crawler_config(&crawler(0, 4, 10_000)).is_err());
        assert!(validate_crawler_config(&crawler(100, 0, 10_000)).is_err());
        assert!(validate_crawler_config(&crawler(100, 65, 10_000)).is_err());
        assert!(validate_crawler_config(&crawler(100, 4, 50)).is_err());
    }

    #[test]
    fn test_validate_fetcher_config() {
        assert!(validate_fetcher_config(&FetcherConfig::default()).is_ok());
        assert!(validate_fetcher_config(&FetcherConfig {
            max_retries: 11,
            retry_delay_ms: 0,
        })
        .is_err());
    }

    #[test]
    fn test_validate_sites() {
        let good = vec![
            SiteEntry {
                domain: "https://shop.example.com".to_string(),
            },
            SiteEntry {
                domain: "store.example.org".to_string(),
            },
        ];
        assert!(validate_sites(&good).is_ok());

        let bad = vec![SiteEntry {
            domain: "mailto:someone".to_string(),
        }];
        assert!(matches!(validate_sites(&bad), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_output_config() {
        assert!(validate_output_config(&OutputConfig {
            directory: "./out".to_string()
        })
        .is_ok());
        assert!(validate_output_config(&OutputConfig {
            directory: "  ".to_string()
        })
        .is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
