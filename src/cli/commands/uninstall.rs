//! The `uninstall` command.

use crate::catalog::RuntimeCatalog;
use crate::cli::args::UninstallArgs;
use crate::config::MonitorkitConfig;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::settings::SettingsStore;
use crate::shell::ScriptRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{finish, lock_target, system_reconciler};

/// Removes the APM agent from some or all PHP versions.
pub struct UninstallCommand<'a> {
    config: &'a MonitorkitConfig,
    args: UninstallArgs,
}

impl<'a> UninstallCommand<'a> {
    pub fn new(config: &'a MonitorkitConfig, args: UninstallArgs) -> Self {
        Self { config, args }
    }

    pub fn run_with<S, R, C>(
        &self,
        reconciler: &mut Reconciler<S, R, C>,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult>
    where
        S: SettingsStore,
        R: ScriptRunner,
        C: RuntimeCatalog,
    {
        let recorded = reconciler.recorded_state()?;
        let report = reconciler.uninstall(self.args.feature, &self.args.php, &recorded)?;
        finish(ui, &report, self.args.json)
    }
}

impl Command for UninstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let _lock = lock_target(self.config, self.args.no_wait)?;

        let mut reconciler = system_reconciler(self.config)?;
        if !self.args.json {
            ui.show_header(&format!("Uninstalling {}", self.args.feature));
        }
        self.run_with(&mut reconciler, ui)
    }
}
