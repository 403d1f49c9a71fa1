//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// The first error as a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const DEBOUNCE_MIN_MS: u64 = 100;
const DEBOUNCE_MAX_MS: u64 = 5000;
const DEBOUNCE_RECOMMENDED_MS: std::ops::RangeInclusive<u64> = 500..=1000;
const MAX_INTROSPECTION_DEPTH: usize = 16;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_monitor(config, &mut result);
        Self::validate_resolver(config, &mut result);
        Self::validate_settings(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = config.browser.endpoint.trim();
        if endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint cannot be empty",
            ));
        } else if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint must start with http:// or https://",
            ));
        }

        if config.browser.url_pattern.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "browser.url_pattern",
                "Empty URL pattern matches the first page tab",
            ));
        }
    }

    fn validate_monitor(config: &Config, result: &mut ValidationResult) {
        let debounce = config.monitor.debounce_ms;
        if !(DEBOUNCE_MIN_MS..=DEBOUNCE_MAX_MS).contains(&debounce) {
            result.add_error(ValidationError::new(
                "monitor.debounce_ms",
                format!(
                    "debounce_ms must be between {} and {}",
                    DEBOUNCE_MIN_MS, DEBOUNCE_MAX_MS
                ),
            ));
        } else if !DEBOUNCE_RECOMMENDED_MS.contains(&debounce) {
            result.add_warning(ValidationWarning::new(
                "monitor.debounce_ms",
                format!(
                    "debounce_ms {} is outside the recommended {}-{} ms",
                    debounce,
                    DEBOUNCE_RECOMMENDED_MS.start(),
                    DEBOUNCE_RECOMMENDED_MS.end()
                ),
            ));
        }

        if config.monitor.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "monitor.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }
    }

    fn validate_resolver(config: &Config, result: &mut ValidationResult) {
        if config.resolver.panel_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "resolver.panel_timeout_ms",
                "panel_timeout_ms must be greater than 0",
            ));
        }

        let depth = config.resolver.introspection_depth;
        if depth == 0 || depth > MAX_INTROSPECTION_DEPTH {
            result.add_error(ValidationError::new(
                "resolver.introspection_depth",
                format!(
                    "introspection_depth must be between 1 and {}",
                    MAX_INTROSPECTION_DEPTH
                ),
            ));
        }

        if config.resolver.max_label_len < 4 {
            result.add_error(ValidationError::new(
                "resolver.max_label_len",
                "max_label_len must leave room for the ellipsis",
            ));
        }
    }

    fn validate_settings(config: &Config, result: &mut ValidationResult) {
        if config.settings.path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "settings.path",
                "Settings path cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
