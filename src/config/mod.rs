//! Configuration loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use monitorkit::config::{load_config_file, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("config.yml");
//! fs::write(&path, "scripts_dir: /opt/agents/sbin\nscript_timeout_secs: 600").unwrap();
//!
//! let config = load_config_file(&path).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.script_timeout_secs, Some(600));
//! ```
//!
//! # Configuration File Location
//!
//! `/etc/monitorkit/config.yml` unless `--config` / `MONITORKIT_CONFIG`
//! points elsewhere. A missing default file means built-in defaults.

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_config, load_config_file, parse_config, DEFAULT_CONFIG_PATH};
pub use schema::{MonitorkitConfig, RuntimeEntry};
pub use validator::{validate, validate_config, ValidationError};
