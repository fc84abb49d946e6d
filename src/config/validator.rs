//! Configuration validation rules.
//!
//! - `script_timeout_secs` must be positive
//! - Runtime versions must be non-empty and unique once separators are dropped

use crate::config::schema::MonitorkitConfig;
use crate::error::{MonitorkitError, Result};
use crate::settings::keys::strip_separators;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &MonitorkitConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.script_timeout_secs == Some(0) {
        errors.push(ValidationError {
            rule: "timeout-zero".to_string(),
            message: "script_timeout_secs must be greater than 0".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for runtime in &config.runtimes {
        let key = strip_separators(&runtime.version);
        if key.is_empty() {
            errors.push(ValidationError {
                rule: "runtime-version-empty".to_string(),
                message: format!(
                    "Runtime '{}' has no usable version label",
                    runtime.binary.display()
                ),
            });
        } else if !seen.insert(key) {
            // "8.1" and "81" share a settings flag.
            errors.push(ValidationError {
                rule: "runtime-version-duplicate".to_string(),
                message: format!("Runtime version '{}' is listed twice", runtime.version),
            });
        }
    }

    errors
}

/// Validate, folding all errors into one `ConfigValidationError`.
pub fn validate(config: &MonitorkitConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(MonitorkitError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
