//! Shared rendering of reports and setup helpers for commands.

use crate::catalog::ConfiguredCatalog;
use crate::config::MonitorkitConfig;
use crate::error::Result;
use crate::lock::InstallLock;
use crate::reconcile::{InstallationReport, Reconciler, Status};
use crate::settings::FileSettingsStore;
use crate::shell::SbinScriptRunner;
use crate::ui::UserInterface;

use super::dispatcher::CommandResult;

/// The engine wired to real collaborators.
pub type SystemReconciler = Reconciler<FileSettingsStore, SbinScriptRunner, ConfiguredCatalog>;

/// Build an engine from configuration.
pub fn system_reconciler(config: &MonitorkitConfig) -> Result<SystemReconciler> {
    let store = FileSettingsStore::open(&config.settings_file())?;
    let runner = SbinScriptRunner::new(config.scripts_dir()).with_timeout(config.script_timeout());
    Ok(Reconciler::new(store, runner, config.catalog()))
}

/// Lock the configured settings file, waiting unless `no_wait` is set.
pub fn lock_target(config: &MonitorkitConfig, no_wait: bool) -> Result<InstallLock> {
    let lock_dir = config.lock_dir();
    let settings_file = config.settings_file();
    if no_wait {
        InstallLock::try_acquire(&lock_dir, &settings_file)
    } else {
        InstallLock::acquire(&lock_dir, &settings_file)
    }
}

/// Print each outcome on the channel matching its status.
pub fn show_report(ui: &mut dyn UserInterface, report: &InstallationReport) {
    for outcome in report.outcomes() {
        let line = outcome.to_string();
        match outcome.status {
            Status::Ok => ui.success(&line),
            Status::Warning => ui.warning(&line),
            Status::Error => ui.error(&line),
        }
    }
}

/// Print the report as text or JSON; exit 1 if any outcome failed.
pub fn finish(
    ui: &mut dyn UserInterface,
    report: &InstallationReport,
    json: bool,
) -> Result<CommandResult> {
    if json {
        let text = serde_json::to_string_pretty(report).map_err(anyhow::Error::from)?;
        ui.raw(&text);
    } else {
        show_report(ui, report);
    }

    Ok(if report.is_success() {
        CommandResult::success()
    } else {
        CommandResult::failure(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorkitError;
    use crate::reconcile::{Action, Outcome, OutcomeKind};
    use crate::ui::MockUI;
    use tempfile::TempDir;

    fn sample() -> InstallationReport {
        let mut report = InstallationReport::new();
        report.push(Outcome::new(
            "infrastructure",
            Action::Install,
            OutcomeKind::Installed,
            "done",
        ));
        report.push(Outcome::new(
            "8.1",
            Action::Skip,
            OutcomeKind::VariantsStillSelected,
            "still selected",
        ));
        report.push(Outcome::new(
            "apm",
            Action::Install,
            OutcomeKind::ScriptExecutionFailed,
            "exit 1",
        ));
        report
    }

    #[test]
    fn show_report_routes_by_status() {
        let mut ui = MockUI::new();
        show_report(&mut ui, &sample());

        assert_eq!(ui.successes(), ["infrastructure: done"]);
        assert_eq!(ui.warnings(), ["8.1: still selected"]);
        assert_eq!(ui.errors(), ["apm: exit 1"]);
    }

    #[test]
    fn finish_fails_on_error_outcome() {
        let mut ui = MockUI::new();
        let result = finish(&mut ui, &sample(), false).unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn finish_json_is_parseable() {
        let mut ui = MockUI::new();
        finish(&mut ui, &sample(), true).unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.raw_output()).unwrap();
        assert_eq!(value["outcomes"][1]["kind"], "variants_still_selected");
        assert!(ui.successes().is_empty());
    }

    #[test]
    fn lock_target_no_wait_fails_when_held() {
        let temp = TempDir::new().unwrap();
        let config = MonitorkitConfig {
            settings_file: Some(temp.path().join("settings.yml")),
            ..Default::default()
        };

        let held = lock_target(&config, true).unwrap();
        let err = lock_target(&config, true).unwrap_err();
        assert!(matches!(err, MonitorkitError::LockBusy { .. }));

        drop(held);
        assert!(lock_target(&config, true).is_ok());
    }
}
