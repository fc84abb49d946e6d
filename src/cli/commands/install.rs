//! The `install` command.

use crate::catalog::RuntimeCatalog;
use crate::cli::args::InstallArgs;
use crate::config::MonitorkitConfig;
use crate::error::Result;
use crate::reconcile::{DesiredConfig, Reconciler};
use crate::settings::SettingsStore;
use crate::shell::ScriptRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{finish, lock_target, system_reconciler};

/// Installs or reinstalls agents and records the result.
pub struct InstallCommand<'a> {
    config: &'a MonitorkitConfig,
    args: InstallArgs,
}

impl<'a> InstallCommand<'a> {
    pub fn new(config: &'a MonitorkitConfig, args: InstallArgs) -> Self {
        Self { config, args }
    }

    pub fn args(&self) -> &InstallArgs {
        &self.args
    }

    fn desired(&self) -> DesiredConfig {
        DesiredConfig::new(self.args.license_key.clone(), self.args.server_name.clone())
            .with_account_id(self.args.account_id)
            .with_infrastructure(self.args.infrastructure)
            .with_apm(self.args.apm)
            .with_variants(self.args.php.iter().cloned())
    }

    /// Run against the given engine. Split out so tests can pass fakes.
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
        let report = reconciler.reconcile(&self.desired(), &recorded)?;
        finish(ui, &report, self.args.json)
    }
}

impl Command for InstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let _lock = lock_target(self.config, self.args.no_wait)?;

        let mut reconciler = system_reconciler(self.config)?;
        if !self.args.json {
            ui.show_header("Installing monitoring agents");
        }
        self.run_with(&mut reconciler, ui)
    }
}
