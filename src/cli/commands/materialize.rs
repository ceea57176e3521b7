//! Materialize command implementation.
//!
//! The `dbtdefs materialize` command runs the asset definition's execution
//! body: `dbt build` against the resolved environment, relaying every event.

use crate::assets::ExecutionContext;
use crate::cli::args::MaterializeArgs;
use crate::dbt::{EventKind, ExecutionEvent};
use crate::definitions::parse_asset_keys;
use crate::error::Result;
use crate::ui::{format_duration, SpinnerHandle, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::workspace::Workspace;

/// The materialize command implementation.
pub struct MaterializeCommand {
    workspace: Workspace,
    args: MaterializeArgs,
}

impl MaterializeCommand {
    pub fn new(workspace: &Workspace, args: MaterializeArgs) -> Self {
        Self {
            workspace: workspace.clone(),
            args,
        }
    }

    pub fn args(&self) -> &MaterializeArgs {
        &self.args
    }

    fn context(&self) -> ExecutionContext {
        if self.args.select.is_empty() {
            ExecutionContext::new()
        } else {
            ExecutionContext::with_selection(parse_asset_keys(&self.args.select))
        }
    }
}

fn relay(event: &ExecutionEvent, ui: &mut dyn UserInterface, spinner: &mut dyn SpinnerHandle) {
    ui.command_output(event.raw());
    match &event.kind {
        EventKind::Materialization { asset_key, .. } => {
            spinner.set_message(&format!("Materialized {}", asset_key));
        }
        EventKind::CheckEvaluation {
            check_name,
            passed: false,
            status,
            ..
        } => {
            tracing::warn!("Check {} finished with status {}", check_name, status);
        }
        EventKind::NodeFailed { unique_id, status } => {
            tracing::warn!("{} finished with status {}", unique_id, status);
        }
        _ => {}
    }
}

impl Command for MaterializeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let defs = self.workspace.load(ui)?;
        let context = self.context();

        if self.args.dry_run {
            let invocation = defs.invocation(&context)?;
            ui.message(&invocation.spec().display());
            return Ok(CommandResult::success());
        }

        let dbt_target = defs
            .dbt()
            .map(|dbt| dbt.config.target.clone())
            .unwrap_or_default();
        ui.show_header(&format!(
            "Materializing assets ({} · {})",
            defs.environment.name, dbt_target
        ));
        ui.show_key_value("Run", &context.run_id.to_string());

        let mut spinner = ui.start_spinner("Running dbt build");
        let outcome = defs.materialize(&context, |event| {
            relay(&event, ui, spinner.as_mut());
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                spinner.finish_error("dbt could not be started");
                return Err(e);
            }
        };

        let duration = format_duration(outcome.duration);
        if outcome.success {
            spinner.finish_success(&format!(
                "Materialized {} assets in {}",
                outcome.materialized.len(),
                duration
            ));
        } else {
            let code = outcome
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            spinner.finish_error(&format!("dbt build failed ({}) after {}", code, duration));
        }

        for check in &outcome.failed_checks {
            ui.warning(&format!("Check failed: {}", check));
        }
        for node in &outcome.failed_nodes {
            ui.error(&format!("Node failed: {}", node));
        }

        if outcome.success {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
