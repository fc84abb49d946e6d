//! The `status` command.

use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::config::MonitorkitConfig;
use crate::error::Result;
use crate::reconcile::{FeatureId, LinkState, RecordedState};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::system_reconciler;

/// Shows what the settings store records as installed.
pub struct StatusCommand<'a> {
    config: &'a MonitorkitConfig,
    args: StatusArgs,
}

#[derive(Serialize)]
struct StatusView<'s> {
    link: LinkState,
    state: &'s RecordedState,
}

impl<'a> StatusCommand<'a> {
    pub fn new(config: &'a MonitorkitConfig, args: StatusArgs) -> Self {
        Self { config, args }
    }

    /// Render a recorded state.
    pub fn show(&self, state: &RecordedState, ui: &mut dyn UserInterface) -> Result<()> {
        if self.args.json {
            let view = StatusView {
                link: state.link_state(),
                state,
            };
            let text = serde_json::to_string_pretty(&view).map_err(anyhow::Error::from)?;
            ui.raw(&text);
            return Ok(());
        }

        ui.show_header("Monitoring agents");
        ui.message(&format!("Link: {}", describe_link(&state.link_state())));
        ui.message(&format!(
            "Server name: {}",
            state.server_name.as_deref().unwrap_or("(not set)")
        ));

        for feature in FeatureId::ALL {
            if state.is_installed(feature) {
                ui.success(&format!("{feature}: installed (install again to reinstall)"));
            } else {
                ui.message(&format!("{feature}: not installed"));
            }
        }

        if state.variants.is_empty() {
            ui.message("No PHP versions found");
        }
        for variant in &state.variants {
            let marker = if variant.installed { " [activated]" } else { "" };
            ui.message(&format!(
                "PHP {} ({}){marker}",
                variant.variant.label,
                variant.variant.binary_path.display()
            ));
        }
        for key in &state.stale_variants {
            ui.warning(&format!(
                "PHP {key}: flagged but no longer installed; run `monitorkit uninstall apm` to clear it"
            ));
        }
        Ok(())
    }
}

impl Command for StatusCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let reconciler = system_reconciler(self.config)?;
        let state = reconciler.recorded_state()?;
        self.show(&state, ui)?;
        Ok(CommandResult::success())
    }
}

fn describe_link(link: &LinkState) -> String {
    match link {
        LinkState::Unregistered => "no license key stored".to_string(),
        LinkState::Registered => "license stored, no account linked".to_string(),
        LinkState::Linked {
            account_id,
            infrastructure,
            apm,
        } => {
            let products: Vec<&str> = [(*infrastructure, "infrastructure"), (*apm, "apm")]
                .into_iter()
                .filter_map(|(on, name)| on.then_some(name))
                .collect();
            if products.is_empty() {
                format!("linked to account {account_id}")
            } else {
                format!("linked to account {account_id} ({})", products.join(", "))
            }
        }
    }
}
