use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{Result, ValidationError, VodseekError};

/// Largest page the backend serves
const MAX_PAGE_SIZE: usize = 100;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_api(config, &mut errors);
        Self::validate_retry(config, &mut errors);
        Self::validate_cache(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_history(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(VodseekError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_api(config: &Config, errors: &mut Vec<ValidationError>) {
        let api = &config.api;

        if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
            errors.push(ValidationError::new(
                "api.base_url",
                format!("Base URL must start with http:// or https://: {}", api.base_url),
            ));
        }

        if api.page_size == 0 || api.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError::new(
                "api.page_size",
                format!("Page size must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }

        if !Self::is_positive_duration(&api.timeout) {
            errors.push(ValidationError::new(
                "api.timeout",
                format!("Invalid duration format: {}", api.timeout),
            ));
        }
    }

    fn validate_retry(config: &Config, errors: &mut Vec<ValidationError>) {
        let retry = &config.retry;

        if retry.max_attempts == 0 {
            errors.push(ValidationError::new(
                "retry.max_attempts",
                "At least one attempt is required",
            ));
        }

        if retry.fallback_attempts == 0 {
            errors.push(ValidationError::new(
                "retry.fallback_attempts",
                "At least one attempt is required",
            ));
        }

        for (path, value) in [
            ("retry.base_delay", &retry.base_delay),
            ("retry.fallback_delay", &retry.fallback_delay),
        ] {
            if !crate::duration::is_valid(value) {
                errors.push(ValidationError::new(
                    path,
                    format!("Invalid duration format: {}", value),
                ));
            }
        }
    }

    fn validate_cache(config: &Config, errors: &mut Vec<ValidationError>) {
        if !Self::is_positive_duration(&config.cache.ttl) {
            errors.push(ValidationError::new(
                "cache.ttl",
                format!("Invalid duration format: {}", config.cache.ttl),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }

        let size_str = &config.storage.max_entry_size;
        match crate::storage::parse_size(size_str) {
            Some(size) if size > 0 => {}
            _ => errors.push(ValidationError::new(
                "storage.max_entry_size",
                format!("Invalid size format: {}", size_str),
            )),
        }
    }

    fn validate_history(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.history.max_items == 0 {
            errors.push(ValidationError::new(
                "history.max_items",
                "History must keep at least one item",
            ));
        }
    }

    fn is_positive_duration(s: &str) -> bool {
        crate::duration::parse(s) > 0
    }
}
