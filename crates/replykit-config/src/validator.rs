//! Configuration validation.

use url::Url;

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

    /// Turn the first error into a `ConfigError`, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
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

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_service(config, &mut result);
        Self::validate_observer(config, &mut result);
        Self::validate_notifications(config, &mut result);
        Self::validate_templates(config, &mut result);
        Self::validate_selectors(config, &mut result);

        Ok(result)
    }

    fn validate_service(config: &Config, result: &mut ValidationResult) {
        match Url::parse(&config.service.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => result.add_error(ValidationError::new(
                "service.api_url",
                "api_url must start with http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "service.api_url",
                format!("api_url is not a valid URL: {}", e),
            )),
        }

        if config.service.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "service.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if config.service.timeout_seconds > 300 {
            result.add_warning(ValidationWarning::new(
                "service.timeout_seconds",
                "timeout_seconds is very high (>300), the loading overlay may stay up for minutes",
            ));
        }
    }

    fn validate_observer(config: &Config, result: &mut ValidationResult) {
        let observer = &config.observer;
        let delays = [
            ("observer.mutation_debounce_ms", observer.mutation_debounce_ms),
            ("observer.navigation_settle_ms", observer.navigation_settle_ms),
            ("observer.external_scan_settle_ms", observer.external_scan_settle_ms),
            ("observer.max_debounce_ms", observer.max_debounce_ms),
        ];
        for (path, value) in delays {
            if value == 0 {
                result.add_error(ValidationError::new(path, "delay must be greater than 0"));
            }
        }

        if observer.max_debounce_ms < observer.mutation_debounce_ms {
            result.add_warning(ValidationWarning::new(
                "observer.max_debounce_ms",
                "max_debounce_ms is below mutation_debounce_ms; mutation scans will fire at the cap",
            ));
        }
    }

    fn validate_notifications(config: &Config, result: &mut ValidationResult) {
        if config.notifications.display_ms == 0 {
            result.add_error(ValidationError::new(
                "notifications.display_ms",
                "display_ms must be greater than 0",
            ));
        }
    }

    fn validate_templates(config: &Config, result: &mut ValidationResult) {
        for (i, template) in config.templates.iter().enumerate() {
            if template.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("templates[{}].name", i),
                    "Template name cannot be empty",
                ));
            }
            if template.content.trim().is_empty() {
                result.add_warning(ValidationWarning::new(
                    format!("templates[{}].content", i),
                    "Template content is empty",
                ));
            }
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        for (role, specs) in config.selectors.overrides() {
            if specs.is_empty() {
                result.add_error(ValidationError::new(
                    format!("selectors.{}", role),
                    "Selector list cannot be empty; remove the key to keep the built-in list",
                ));
            }
            for (i, spec) in specs.iter().enumerate() {
                if spec.selector().trim().is_empty() {
                    result.add_error(ValidationError::new(
                        format!("selectors.{}[{}]", role, i),
                        "Selector cannot be empty",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
