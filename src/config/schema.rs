//! Configuration schema definitions.
//!
//! These structs map to the YAML configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::{ConfiguredCatalog, PhpDirectoryCatalog, StaticCatalog};

/// Default location of installer scripts.
pub const DEFAULT_SCRIPTS_DIR: &str = "/usr/local/lib/monitorkit/sbin";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorkitConfig {
    /// Directory holding `infrastructure.sh`, `apm.sh` and friends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,

    /// Settings file recording installed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<PathBuf>,

    /// Where lock files go. Defaults to the settings file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,

    /// Root of panel-managed PHP installs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub php_root: Option<PathBuf>,

    /// Explicit runtime list; replaces scanning `php_root` when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtimes: Vec<RuntimeEntry>,

    /// Kill installer scripts that run longer than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_timeout_secs: Option<u64>,
}

/// One runtime in an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEntry {
    /// Version label, e.g. `"8.1"`.
    pub version: String,

    /// Path of the runtime binary.
    pub binary: PathBuf,
}

impl MonitorkitConfig {
    pub fn scripts_dir(&self) -> PathBuf {
        self.scripts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPTS_DIR))
    }

    pub fn settings_file(&self) -> PathBuf {
        self.settings_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("/var/lib"))
                .join("monitorkit")
                .join("settings.yml")
        })
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(|| {
            self.settings_file()
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(std::env::temp_dir)
        })
    }

    pub fn php_root(&self) -> PathBuf {
        self.php_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(PhpDirectoryCatalog::DEFAULT_ROOT))
    }

    /// The explicit runtime list if given, else a scan of `php_root`.
    pub fn catalog(&self) -> ConfiguredCatalog {
        if self.runtimes.is_empty() {
            ConfiguredCatalog::Directory(PhpDirectoryCatalog::new(self.php_root()))
        } else {
            ConfiguredCatalog::Static(StaticCatalog::new(
                self.runtimes
                    .iter()
                    .map(|r| (r.version.clone(), r.binary.clone())),
            ))
        }
    }

    pub fn script_timeout(&self) -> Option<std::time::Duration> {
        self.script_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}
