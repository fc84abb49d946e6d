//! Installation-state reconciliation.
//!
//! The [`Reconciler`] compares a [`DesiredConfig`] with the
//! [`RecordedState`] read from the settings store, runs the installer
//! scripts needed to converge them, and persists what succeeded. Every
//! per-action result lands in an [`InstallationReport`]; only faults of the
//! store or catalog themselves surface as `Err`.
//!
//! # Example
//!
//! ```
//! use monitorkit::catalog::StaticCatalog;
//! use monitorkit::reconcile::{DesiredConfig, Reconciler};
//! use monitorkit::settings::MemorySettingsStore;
//! use monitorkit::shell::FakeScriptRunner;
//!
//! let mut reconciler = Reconciler::new(
//!     MemorySettingsStore::new(),
//!     FakeScriptRunner::new(),
//!     StaticCatalog::new([("8.1", "/usr/bin/php8.1")]),
//! );
//!
//! let desired = DesiredConfig::new("A".repeat(40), "web01")
//!     .with_infrastructure(true)
//!     .with_apm(true)
//!     .with_variants(["8.1"]);
//!
//! let recorded = reconciler.recorded_state().unwrap();
//! let report = reconciler.reconcile(&desired, &recorded).unwrap();
//!
//! assert!(report.is_success());
//! assert!(reconciler.recorded_state().unwrap().variant_installed("8.1"));
//! ```

pub mod engine;
pub mod report;
pub mod types;

pub use engine::Reconciler;
pub use report::{Action, InstallationReport, Outcome, OutcomeKind, Status};
pub use types::{
    AccountId, DesiredConfig, FeatureId, LicenseKey, LinkState, RecordedState, ServerName,
    VariantState,
};
