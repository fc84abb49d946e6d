//! Input and state types for reconciliation.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::{RuntimeCatalog, RuntimeVariant};
use crate::error::{MonitorkitError, Result};
use crate::settings::{is_truthy, keys, variant_flag_key, SettingsStore};

/// The monitoring license key shared by both add-ons.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Required length of a license key, in bytes.
    pub const LENGTH: usize = 40;

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// A key is valid when it is non-empty and exactly [`Self::LENGTH`] long.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() == Self::LENGTH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the key out of logs.
impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LicenseKey({} bytes)", self.0.len())
    }
}

/// A server label with control characters removed and whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName(String);

impl ServerName {
    pub fn sanitize(raw: &str) -> Self {
        let printable: String = raw.chars().filter(|c| !c.is_control()).collect();
        Self(printable.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional external account id. `None` means "not yet linked".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountId(Option<u64>);

impl AccountId {
    pub fn new(id: Option<u64>) -> Self {
        Self(id)
    }

    /// Parse user input: empty means unlinked, anything else must be digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self(None));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(MonitorkitError::InvalidAccountId {
                value: raw.to_string(),
            });
        }
        trimmed
            .parse()
            .map(|id| Self(Some(id)))
            .map_err(|_| MonitorkitError::InvalidAccountId {
                value: raw.to_string(),
            })
    }

    pub fn get(&self) -> Option<u64> {
        self.0
    }

    /// Settings value: the integer, or an empty string when unlinked.
    pub fn to_setting(&self) -> String {
        self.0.map(|id| id.to_string()).unwrap_or_default()
    }
}

/// The installable add-ons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeatureId {
    /// Host-level infrastructure agent.
    Infrastructure,
    /// Application performance monitoring agent for PHP.
    Apm,
}

impl FeatureId {
    /// Every feature, in reconciliation order.
    pub const ALL: [FeatureId; 2] = [FeatureId::Infrastructure, FeatureId::Apm];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureId::Infrastructure => "infrastructure",
            FeatureId::Apm => "apm",
        }
    }

    /// Settings key holding the installed flag.
    pub fn settings_key(&self) -> &'static str {
        self.name()
    }

    /// Installer script for this feature.
    pub fn install_script(&self) -> &'static str {
        match self {
            FeatureId::Infrastructure => "infrastructure.sh",
            FeatureId::Apm => "apm.sh",
        }
    }

    /// Positional arguments for the install script.
    ///
    /// Only APM takes the colon-joined runtime paths.
    pub fn install_args(
        &self,
        license: &LicenseKey,
        server: &ServerName,
        variant_paths: &str,
    ) -> Vec<String> {
        let mut args = vec![license.as_str().to_string(), server.as_str().to_string()];
        match self {
            FeatureId::Infrastructure => {}
            FeatureId::Apm => args.push(variant_paths.to_string()),
        }
        args
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the caller wants installed.
#[derive(Debug, Clone)]
pub struct DesiredConfig {
    pub license_key: LicenseKey,
    /// Raw server label; sanitized before use.
    pub server_name: String,
    pub account_id: AccountId,
    pub install_infrastructure: bool,
    pub install_apm: bool,
    /// Requested runtime versions, e.g. `"8.1"`. Only used with APM.
    pub requested_variants: BTreeSet<String>,
}

impl DesiredConfig {
    pub fn new(license_key: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self {
            license_key: LicenseKey::new(license_key),
            server_name: server_name.into(),
            account_id: AccountId::default(),
            install_infrastructure: false,
            install_apm: false,
            requested_variants: BTreeSet::new(),
        }
    }

    pub fn with_account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn with_infrastructure(mut self, install: bool) -> Self {
        self.install_infrastructure = install;
        self
    }

    pub fn with_apm(mut self, install: bool) -> Self {
        self.install_apm = install;
        self
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    pub fn wants(&self, feature: FeatureId) -> bool {
        match feature {
            FeatureId::Infrastructure => self.install_infrastructure,
            FeatureId::Apm => self.install_apm,
        }
    }

    /// Whether `variant` was requested, ignoring separators.
    pub fn requests_variant(&self, variant: &RuntimeVariant) -> bool {
        self.requested_variants.iter().any(|r| variant.matches(r))
    }
}

/// A catalog variant and whether its flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantState {
    #[serde(flatten)]
    pub variant: RuntimeVariant,
    pub installed: bool,
}

/// How far the installation is linked to an external account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// No license key stored yet.
    Unregistered,
    /// License stored, account id not set.
    Registered,
    /// Account linked; flags tell which product dashboards apply.
    Linked {
        account_id: String,
        infrastructure: bool,
        apm: bool,
    },
}

/// Snapshot of what the settings store says is installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordedState {
    #[serde(skip)]
    pub license_key: Option<String>,
    pub server_name: Option<String>,
    pub account_id: Option<String>,
    pub infrastructure: bool,
    pub apm: bool,
    /// Catalog variants, in catalog order.
    pub variants: Vec<VariantState>,
    /// Flagged runtime keys (e.g. `"74"`) with no catalog variant, such as
    /// versions removed from the host after instrumentation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale_variants: Vec<String>,
}

impl RecordedState {
    /// Read flags for every feature and every catalog variant.
    pub fn load(store: &dyn SettingsStore, catalog: &dyn RuntimeCatalog) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let mut variants = Vec::new();
        for variant in catalog.list_variants()? {
            let installed = is_truthy(store.get(&variant_flag_key(&variant.label))?.as_deref());
            variants.push(VariantState { variant, installed });
        }

        let mut stale_variants = Vec::new();
        for key in store.keys()? {
            let Some(suffix) = key.strip_prefix(keys::VARIANT_PREFIX) else {
                continue;
            };
            if variants.iter().any(|v| v.variant.key() == suffix) {
                continue;
            }
            if is_truthy(store.get(&key)?.as_deref()) {
                stale_variants.push(suffix.to_string());
            }
        }

        Ok(Self {
            license_key: non_empty(store.get(keys::LICENSE_KEY)?),
            server_name: non_empty(store.get(keys::SERVER_NAME)?),
            account_id: non_empty(store.get(keys::ACCOUNT_ID)?),
            infrastructure: is_truthy(
                store
                    .get(FeatureId::Infrastructure.settings_key())?
                    .as_deref(),
            ),
            apm: is_truthy(store.get(FeatureId::Apm.settings_key())?.as_deref()),
            variants,
            stale_variants,
        })
    }

    pub fn is_installed(&self, feature: FeatureId) -> bool {
        match feature {
            FeatureId::Infrastructure => self.infrastructure,
            FeatureId::Apm => self.apm,
        }
    }

    /// Whether the variant named `label` is flagged installed.
    pub fn variant_installed(&self, label: &str) -> bool {
        self.variants
            .iter()
            .any(|v| v.installed && v.variant.matches(label))
    }

    /// Flagged variants, in catalog order.
    pub fn installed_variants(&self) -> impl Iterator<Item = &RuntimeVariant> {
        self.variants
            .iter()
            .filter(|v| v.installed)
            .map(|v| &v.variant)
    }

    pub fn link_state(&self) -> LinkState {
        match (&self.license_key, &self.account_id) {
            (None, _) => LinkState::Unregistered,
            (Some(_), None) => LinkState::Registered,
            (Some(_), Some(account_id)) => LinkState::Linked {
                account_id: account_id.clone(),
                infrastructure: self.infrastructure,
                apm: self.apm,
            },
        }
    }
}

/// Colon-join binary paths for script arguments.
pub(crate) fn join_paths<'a>(variants: impl IntoIterator<Item = &'a RuntimeVariant>) -> String {
    variants
        .into_iter()
        .map(|v| v.binary_path.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::settings::MemorySettingsStore;

    #[test]
    fn license_key_requires_exact_length() {
        assert!(LicenseKey::new("A".repeat(40)).is_valid());
        assert!(!LicenseKey::new("A".repeat(39)).is_valid());
        assert!(!LicenseKey::new("A".repeat(41)).is_valid());
        assert!(!LicenseKey::new("").is_valid());
    }

    #[test]
    fn license_key_debug_hides_value() {
        let key = LicenseKey::new("secret".repeat(5));
        let debug = format!("{:?}", key);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("30 bytes"));
    }

    #[test]
    fn server_name_strips_control_characters() {
        assert_eq!(ServerName::sanitize("host\x07name").as_str(), "hostname");
    }

    #[test]
    fn server_name_trims_after_stripping() {
        assert_eq!(ServerName::sanitize("  web 01 \x1b\n").as_str(), "web 01");
        assert_eq!(ServerName::sanitize("\tdb\r").as_str(), "db");
    }

    #[test]
    fn account_id_parses_digits() {
        assert_eq!(AccountId::parse("0042").unwrap().get(), Some(42));
        assert_eq!(AccountId::parse("0042").unwrap().to_setting(), "42");
    }

    #[test]
    fn account_id_empty_is_unlinked() {
        let id = AccountId::parse("  ").unwrap();
        assert_eq!(id.get(), None);
        assert_eq!(id.to_setting(), "");
    }

    #[test]
    fn account_id_rejects_non_digits() {
        assert!(matches!(
            AccountId::parse("12ab"),
            Err(MonitorkitError::InvalidAccountId { .. })
        ));
        assert!(AccountId::parse("-5").is_err());
    }

    #[test]
    fn feature_install_args() {
        let key = LicenseKey::new("k");
        let name = ServerName::sanitize("n");

        assert_eq!(
            FeatureId::Infrastructure.install_args(&key, &name, "ignored"),
            vec!["k", "n"]
        );
        assert_eq!(
            FeatureId::Apm.install_args(&key, &name, "/a:/b"),
            vec!["k", "n", "/a:/b"]
        );
    }

    #[test]
    fn desired_config_matches_variants_without_separators() {
        let desired = DesiredConfig::new("k", "n").with_variants(["81"]);
        assert!(desired.requests_variant(&RuntimeVariant::new("8.1", "/p")));
        assert!(!desired.requests_variant(&RuntimeVariant::new("8.2", "/p")));
    }

    #[test]
    fn recorded_state_reads_flags() {
        let store = MemorySettingsStore::with_values([
            ("license_key", "k"),
            ("apm", "1"),
            ("php_versions_82", "true"),
        ]);
        let catalog = StaticCatalog::new([("8.1", "/p81"), ("8.2", "/p82")]);

        let state = RecordedState::load(&store, &catalog).unwrap();

        assert!(state.apm);
        assert!(!state.infrastructure);
        assert!(state.variant_installed("8.2"));
        assert!(!state.variant_installed("8.1"));
        let installed: Vec<_> = state.installed_variants().map(|v| v.label.as_str()).collect();
        assert_eq!(installed, ["8.2"]);
        assert!(state.stale_variants.is_empty());
    }

    #[test]
    fn recorded_state_finds_flags_outside_catalog() {
        let store = MemorySettingsStore::with_values([
            ("apm", "true"),
            ("php_versions_74", "true"),
            ("php_versions_73", "0"),
            ("php_versions_81", "true"),
        ]);
        let catalog = StaticCatalog::new([("8.1", "/p81")]);

        let state = RecordedState::load(&store, &catalog).unwrap();

        assert_eq!(state.stale_variants, ["74"]);
        assert!(state.variant_installed("8.1"));
    }

    #[test]
    fn link_state_progression() {
        let mut state = RecordedState::default();
        assert_eq!(state.link_state(), LinkState::Unregistered);

        state.license_key = Some("k".into());
        assert_eq!(state.link_state(), LinkState::Registered);

        state.account_id = Some("7".into());
        state.apm = true;
        assert_eq!(
            state.link_state(),
            LinkState::Linked {
                account_id: "7".into(),
                infrastructure: false,
                apm: true,
            }
        );
    }

    #[test]
    fn join_paths_uses_colons() {
        let a = RuntimeVariant::new("8.1", "/a/php");
        let b = RuntimeVariant::new("8.2", "/b/php");
        assert_eq!(join_paths([&a, &b]), "/a/php:/b/php");
        assert_eq!(join_paths(std::iter::empty()), "");
    }
}
