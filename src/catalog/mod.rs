//! Runtime catalog: which PHP versions exist on the host and where.
//!
//! The APM agent instruments one PHP binary per version. The panel installs
//! each version under its own prefix (`/opt/plesk/php/8.1/bin/php`), so the
//! default catalog scans that directory. A static list from the config file
//! can replace the scan.
//!
//! # Example
//!
//! ```
//! use monitorkit::catalog::{RuntimeCatalog, StaticCatalog};
//!
//! let catalog = StaticCatalog::new([("8.1", "/usr/bin/php8.1"), ("8.2", "/usr/bin/php8.2")]);
//! let labels: Vec<_> = catalog
//!     .list_variants()
//!     .unwrap()
//!     .into_iter()
//!     .map(|v| v.label)
//!     .collect();
//! assert_eq!(labels, ["8.1", "8.2"]);
//! ```

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{MonitorkitError, Result};
use crate::settings::keys::strip_separators;

/// One installed runtime version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeVariant {
    /// Version label as the panel shows it, e.g. `"8.1"`.
    pub label: String,

    /// Absolute path of the runtime binary.
    pub binary_path: PathBuf,
}

impl RuntimeVariant {
    pub fn new(label: impl Into<String>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            binary_path: binary_path.into(),
        }
    }

    /// Label with separators removed; the identity used for matching.
    pub fn key(&self) -> String {
        strip_separators(&self.label)
    }

    /// Whether `requested` names this variant (`"8.1"` and `"81"` both do).
    pub fn matches(&self, requested: &str) -> bool {
        self.key() == strip_separators(requested)
    }
}

/// Enumerates available runtime variants.
///
/// The returned order must be stable across calls: it decides the order of
/// binary paths handed to installer scripts.
pub trait RuntimeCatalog {
    fn list_variants(&self) -> Result<Vec<RuntimeVariant>>;
}

/// A fixed, ordered list of variants.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    variants: Vec<RuntimeVariant>,
}

impl StaticCatalog {
    pub fn new<L, P>(entries: impl IntoIterator<Item = (L, P)>) -> Self
    where
        L: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            variants: entries
                .into_iter()
                .map(|(label, path)| RuntimeVariant::new(label, path))
                .collect(),
        }
    }

    /// An empty catalog: no runtimes installed.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl RuntimeCatalog for StaticCatalog {
    fn list_variants(&self) -> Result<Vec<RuntimeVariant>> {
        Ok(self.variants.clone())
    }
}

/// Scans `<root>/<version>/bin/php` for panel-managed PHP installs.
#[derive(Debug, Clone)]
pub struct PhpDirectoryCatalog {
    root: PathBuf,
}

impl PhpDirectoryCatalog {
    /// Default install prefix for panel-managed PHP versions.
    pub const DEFAULT_ROOT: &'static str = "/opt/plesk/php";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RuntimeCatalog for PhpDirectoryCatalog {
    fn list_variants(&self) -> Result<Vec<RuntimeVariant>> {
        if !self.root.is_dir() {
            tracing::debug!("PHP root {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| MonitorkitError::CatalogError {
            path: self.root.clone(),
            message: e.to_string(),
        })?;

        let mut variants = Vec::new();
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if !VERSION_DIR.is_match(&name) {
                continue;
            }
            let binary = entry.path().join("bin").join("php");
            if binary.is_file() {
                variants.push(RuntimeVariant::new(name, binary));
            }
        }

        variants.sort_by(|a, b| compare_versions(&a.label, &b.label));
        tracing::debug!(
            "Found {} PHP runtime(s) under {}",
            variants.len(),
            self.root.display()
        );
        Ok(variants)
    }
}

/// Catalog chosen by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredCatalog {
    Static(StaticCatalog),
    Directory(PhpDirectoryCatalog),
}

impl RuntimeCatalog for ConfiguredCatalog {
    fn list_variants(&self) -> Result<Vec<RuntimeVariant>> {
        match self {
            ConfiguredCatalog::Static(c) => c.list_variants(),
            ConfiguredCatalog::Directory(c) => c.list_variants(),
        }
    }
}

// Panel PHP prefixes are named by bare version, e.g. `8.1`.
static VERSION_DIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());

/// Order dotted versions numerically, so `"8.10"` sorts after `"8.9"`.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    parse(a).cmp(&parse(b)).then_with(|| a.cmp(b))
}
