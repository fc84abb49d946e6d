//! Monitorkit - install and reconcile monitoring agents on a hosting panel.
//!
//! Monitorkit drives vendor installer scripts for an infrastructure agent
//! and a per-PHP-version APM agent, and records what succeeded in a small
//! settings store so the panel can show what is installed.
//!
//! # Modules
//!
//! - [`catalog`] - Installed PHP runtime discovery
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and result aliases
//! - [`lock`] - Cross-process single-flight locking
//! - [`reconcile`] - The reconciliation engine and its report
//! - [`settings`] - Persistent key/value settings
//! - [`shell`] - Installer script execution
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use monitorkit::catalog::StaticCatalog;
//! use monitorkit::reconcile::{DesiredConfig, Reconciler};
//! use monitorkit::settings::MemorySettingsStore;
//! use monitorkit::shell::FakeScriptRunner;
//!
//! let mut engine = Reconciler::new(
//!     MemorySettingsStore::new(),
//!     FakeScriptRunner::new(),
//!     StaticCatalog::empty(),
//! );
//! let desired = DesiredConfig::new("a".repeat(40), "web01").with_infrastructure(true);
//! let recorded = engine.recorded_state().unwrap();
//! let report = engine.reconcile(&desired, &recorded).unwrap();
//! assert!(report.is_success());
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod reconcile;
pub mod settings;
pub mod shell;
pub mod ui;

pub use error::{MonitorkitError, Result};
