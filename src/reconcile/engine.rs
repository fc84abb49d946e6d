//! The reconciliation engine.

use crate::catalog::{RuntimeCatalog, RuntimeVariant};
use crate::error::Result;
use crate::settings::keys::strip_separators;
use crate::settings::{keys, variant_flag_key, SettingsStore, FLAG_TRUE};
use crate::shell::ScriptRunner;

use super::report::{Action, InstallationReport, Outcome, OutcomeKind};
use super::types::{join_paths, DesiredConfig, FeatureId, LicenseKey, RecordedState, ServerName};

/// Script that records which runtimes must be cleaned up on removal.
pub const TRACKING_SCRIPT: &str = "phpversionsuninstall.sh";

/// Subject used for license outcomes.
const LICENSE_SUBJECT: &str = "license";

/// Drives installer scripts and keeps the settings store in step with them.
///
/// Calls take `&mut self`, so one engine never runs two reconciliations at
/// once. Cross-process exclusion is the caller's job (see
/// [`crate::lock::InstallLock`]).
pub struct Reconciler<S, R, C> {
    store: S,
    runner: R,
    catalog: C,
}

impl<S, R, C> Reconciler<S, R, C>
where
    S: SettingsStore,
    R: ScriptRunner,
    C: RuntimeCatalog,
{
    pub fn new(store: S, runner: R, catalog: C) -> Self {
        Self {
            store,
            runner,
            catalog,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (S, R, C) {
        (self.store, self.runner, self.catalog)
    }

    /// Snapshot of the current flags.
    pub fn recorded_state(&self) -> Result<RecordedState> {
        RecordedState::load(&self.store, &self.catalog)
    }

    /// Converge the installation towards `desired`.
    ///
    /// An invalid license short-circuits with a single `InvalidLicense`
    /// outcome and no writes. Otherwise credentials are stored first, then
    /// infrastructure and APM are handled in that order; a failure in one
    /// does not stop the other.
    pub fn reconcile(
        &mut self,
        desired: &DesiredConfig,
        recorded: &RecordedState,
    ) -> Result<InstallationReport> {
        let mut report = InstallationReport::new();

        if !desired.license_key.is_valid() {
            tracing::debug!("Rejecting {:?}", desired.license_key);
            report.push(Outcome::new(
                LICENSE_SUBJECT,
                Action::Skip,
                OutcomeKind::InvalidLicense,
                format!(
                    "License key must be exactly {} characters",
                    LicenseKey::LENGTH
                ),
            ));
            return Ok(report);
        }

        let server_name = ServerName::sanitize(&desired.server_name);
        self.store
            .set(keys::LICENSE_KEY, desired.license_key.as_str())?;
        self.store.set(keys::SERVER_NAME, server_name.as_str())?;
        self.store
            .set(keys::ACCOUNT_ID, &desired.account_id.to_setting())?;

        if desired.wants(FeatureId::Infrastructure) {
            self.install_infrastructure(&desired.license_key, &server_name, &mut report)?;
        }

        if desired.wants(FeatureId::Apm) {
            self.install_apm(desired, recorded, &server_name, &mut report)?;
        } else {
            warn_selected_variants(desired, recorded, &mut report);
        }

        Ok(report)
    }

    /// Remove a feature, or some of its runtime variants.
    ///
    /// For APM, `variants` names the runtimes to drop; empty means all of
    /// them. When no flagged runtime remains, the `apm` flag is cleared too.
    pub fn uninstall(
        &mut self,
        feature: FeatureId,
        variants: &[String],
        recorded: &RecordedState,
    ) -> Result<InstallationReport> {
        let mut report = InstallationReport::new();

        match feature {
            FeatureId::Infrastructure => {
                report.push(Outcome::new(
                    feature.name(),
                    Action::Skip,
                    OutcomeKind::UninstallNotSupported,
                    "No uninstall script is shipped for the infrastructure agent; remove it with the system package manager",
                ));
            }
            FeatureId::Apm => self.uninstall_apm(variants, recorded, &mut report)?,
        }

        Ok(report)
    }

    fn install_infrastructure(
        &mut self,
        license: &LicenseKey,
        server_name: &ServerName,
        report: &mut InstallationReport,
    ) -> Result<()> {
        let feature = FeatureId::Infrastructure;
        let args = feature.install_args(license, server_name, "");

        match self.run_script(feature.install_script(), &args) {
            Ok(()) => {
                self.store.set(feature.settings_key(), FLAG_TRUE)?;
                report.push(Outcome::new(
                    feature.name(),
                    Action::Install,
                    OutcomeKind::Installed,
                    "Infrastructure agent installed",
                ));
            }
            Err(message) => report.push(failure(feature.name(), Action::Install, message)),
        }
        Ok(())
    }

    fn install_apm(
        &mut self,
        desired: &DesiredConfig,
        recorded: &RecordedState,
        server_name: &ServerName,
        report: &mut InstallationReport,
    ) -> Result<()> {
        let feature = FeatureId::Apm;
        let available = self.catalog.list_variants()?;
        let selected: Vec<&RuntimeVariant> = available
            .iter()
            .filter(|v| desired.requests_variant(v))
            .collect();

        if selected.is_empty() {
            report.push(Outcome::new(
                feature.name(),
                Action::Skip,
                OutcomeKind::NoRuntimeSelected,
                "Select at least one installed PHP version to install the APM agent",
            ));
            return Ok(());
        }

        let paths = join_paths(selected.iter().copied());
        let args = feature.install_args(&desired.license_key, server_name, &paths);

        if let Err(message) = self.run_script(feature.install_script(), &args) {
            report.push(failure(feature.name(), Action::Install, message));
            return Ok(());
        }

        self.store.set(feature.settings_key(), FLAG_TRUE)?;
        for variant in &selected {
            self.store.set(&variant_flag_key(&variant.label), FLAG_TRUE)?;
        }
        let labels: Vec<&str> = selected.iter().map(|v| v.label.as_str()).collect();
        report.push(Outcome::new(
            feature.name(),
            Action::Install,
            OutcomeKind::Installed,
            format!("APM agent installed for PHP {}", labels.join(", ")),
        ));

        // Everything instrumented now or earlier has to be cleaned up on
        // removal, so the tracking list is the union, in catalog order.
        let tracked: Vec<&RuntimeVariant> = available
            .iter()
            .filter(|v| selected.contains(v) || recorded.variant_installed(&v.label))
            .collect();
        let args = vec![String::new(), String::new(), join_paths(tracked)];
        if let Err(message) = self.run_script(TRACKING_SCRIPT, &args) {
            report.push(Outcome::new(
                feature.name(),
                Action::Install,
                OutcomeKind::TrackingFailed,
                message,
            ));
        }

        Ok(())
    }

    fn uninstall_apm(
        &mut self,
        requested: &[String],
        recorded: &RecordedState,
        report: &mut InstallationReport,
    ) -> Result<()> {
        let feature = FeatureId::Apm;
        let flagged: Vec<&RuntimeVariant> = recorded.installed_variants().collect();
        let (removed, remaining): (Vec<&RuntimeVariant>, Vec<&RuntimeVariant>) =
            flagged.into_iter().partition(|v| {
                requested.is_empty() || requested.iter().any(|r| v.matches(r))
            });

        let stale: Vec<&String> = recorded
            .stale_variants
            .iter()
            .filter(|key| {
                requested.is_empty() || requested.iter().any(|r| strip_separators(r) == **key)
            })
            .collect();

        // `apm` can be flagged with no catalog runtime flagged, e.g. after a
        // PHP version was removed from the host. A full uninstall still
        // clears it.
        let clears_feature = requested.is_empty() && recorded.apm;
        if removed.is_empty() && stale.is_empty() && !clears_feature {
            report.push(Outcome::new(
                feature.name(),
                Action::Skip,
                OutcomeKind::NothingToUninstall,
                "No selected PHP version has the APM agent installed",
            ));
            return Ok(());
        }

        let args = vec![
            String::new(),
            String::new(),
            join_paths(remaining.iter().copied()),
        ];
        if let Err(message) = self.run_script(TRACKING_SCRIPT, &args) {
            report.push(failure(feature.name(), Action::Uninstall, message));
            return Ok(());
        }

        for variant in &removed {
            self.store.remove(&variant_flag_key(&variant.label))?;
            report.push(Outcome::new(
                variant.label.as_str(),
                Action::Uninstall,
                OutcomeKind::Uninstalled,
                "APM instrumentation removed",
            ));
        }
        for key in &stale {
            self.store.remove(&variant_flag_key(key))?;
            report.push(Outcome::new(
                key.as_str(),
                Action::Uninstall,
                OutcomeKind::Uninstalled,
                "Flag for a PHP version no longer on this host cleared",
            ));
        }

        if remaining.is_empty() && (recorded.apm || !removed.is_empty()) {
            self.store.remove(feature.settings_key())?;
            report.push(Outcome::new(
                feature.name(),
                Action::Uninstall,
                OutcomeKind::Uninstalled,
                "APM agent removed from all PHP versions",
            ));
        }

        Ok(())
    }

    /// Run a script; `Err` carries the message for a failure outcome.
    fn run_script(&mut self, script: &str, args: &[String]) -> std::result::Result<(), String> {
        match self.runner.run(script, args) {
            Ok(output) if output.success() => {
                tracing::debug!("{} succeeded", script);
                Ok(())
            }
            Ok(output) => {
                tracing::debug!("{} failed with {:?}", script, output.exit_code);
                let combined = output.combined_output();
                if combined.is_empty() {
                    Err(match output.exit_code {
                        Some(code) => format!("{} exited with code {}", script, code),
                        None => format!("{} was terminated by a signal", script),
                    })
                } else {
                    Err(combined)
                }
            }
            Err(e) => {
                tracing::debug!("{} could not run: {}", script, e);
                Err(e.to_string())
            }
        }
    }
}

fn failure(subject: &str, action: Action, message: String) -> Outcome {
    Outcome::new(subject, action, OutcomeKind::ScriptExecutionFailed, message)
}

/// APM is not being installed: point out runtimes that are still flagged or
/// were ticked anyway. Nothing is changed.
fn warn_selected_variants(
    desired: &DesiredConfig,
    recorded: &RecordedState,
    report: &mut InstallationReport,
) {
    for state in &recorded.variants {
        if state.installed || desired.requests_variant(&state.variant) {
            report.push(Outcome::new(
                state.variant.label.as_str(),
                Action::Skip,
                OutcomeKind::VariantsStillSelected,
                "PHP version is selected but APM is not being installed; uninstall it explicitly to remove instrumentation",
            ));
        }
    }
    for key in &recorded.stale_variants {
        report.push(Outcome::new(
            key.as_str(),
            Action::Skip,
            OutcomeKind::VariantsStillSelected,
            "PHP version is flagged but no longer installed on this host; uninstall APM to clear it",
        ));
    }
}
