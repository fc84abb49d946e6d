//! Configuration file loading.

use crate::config::schema::MonitorkitConfig;
use crate::error::{MonitorkitError, Result};
use std::fs;
use std::path::Path;

/// Where the config lives when nothing overrides it.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/monitorkit/config.yml";

/// Load the effective configuration.
///
/// An explicit path must exist. Without one, a missing
/// [`DEFAULT_CONFIG_PATH`] yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<MonitorkitConfig> {
    match explicit {
        Some(path) => load_config_file(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_config_file(path)
            } else {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(MonitorkitConfig::default())
            }
        }
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<MonitorkitConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MonitorkitError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MonitorkitError::Io(e)
        }
    })?;

    tracing::debug!("Loaded config from {}", path.display());
    parse_config(&content, path)
}

/// Parse YAML content. `source_path` is only used in errors.
pub fn parse_config(content: &str, source_path: &Path) -> Result<MonitorkitConfig> {
    // An empty file is a valid, all-defaults config.
    if content.trim().is_empty() {
        return Ok(MonitorkitConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| MonitorkitError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
