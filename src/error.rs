//! Error types for monitorkit operations.
//!
//! This module defines [`MonitorkitError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Per-action installer failures are NOT errors: the reconciliation engine
//!   records them as outcomes in its report and carries on
//! - `MonitorkitError` covers faults of the surrounding machinery (config,
//!   settings file, script spawning, locks)
//! - Use `anyhow::Error` (via `MonitorkitError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for monitorkit operations.
#[derive(Debug, Error)]
pub enum MonitorkitError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Account id was supplied but is not a non-negative integer.
    #[error("Invalid account id '{value}': expected digits only")]
    InvalidAccountId { value: String },

    /// Settings file could not be read or written.
    #[error("Settings store error at {path}: {message}")]
    SettingsError { path: PathBuf, message: String },

    /// Installer script could not be started at all.
    #[error("Failed to start script '{script}': {message}")]
    ScriptSpawnFailed { script: String, message: String },

    /// Installer script exceeded its time budget and was killed.
    #[error("Script '{script}' timed out after {seconds}s")]
    ScriptTimedOut { script: String, seconds: u64 },

    /// Runtime catalog could not be enumerated.
    #[error("Failed to list runtimes under {path}: {message}")]
    CatalogError { path: PathBuf, message: String },

    /// Another process holds the installation lock.
    #[error("Installation target is locked by another process: {path}")]
    LockBusy { path: PathBuf },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for monitorkit operations.
pub type Result<T> = std::result::Result<T, MonitorkitError>;
