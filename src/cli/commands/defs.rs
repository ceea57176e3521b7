//! Defs command implementation.
//!
//! The `dbtdefs defs` command shows the resolved definitions: the
//! environment, the `dbt` resource, and the declared assets.

use crate::cli::args::DefsArgs;
use crate::config::SettingsPaths;
use crate::error::{DbtdefsError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::workspace::Workspace;

/// The defs command implementation.
pub struct DefsCommand {
    workspace: Workspace,
    args: DefsArgs,
}

impl DefsCommand {
    pub fn new(workspace: &Workspace, args: DefsArgs) -> Self {
        Self {
            workspace: workspace.clone(),
            args,
        }
    }

    pub fn args(&self) -> &DefsArgs {
        &self.args
    }
}

impl Command for DefsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let defs = self.workspace.load(ui)?;

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&defs).map_err(|e| DbtdefsError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        let paths = match &self.workspace.config {
            Some(path) => vec![path.clone()],
            None => SettingsPaths::discover(&self.workspace.root)
                .all_existing()
                .into_iter()
                .cloned()
                .collect(),
        };
        if !paths.is_empty() {
            for path in &paths {
                ui.message(&format!("# {}", path.display()));
            }
            ui.message("");
        }

        let yaml = serde_yaml::to_string(&defs).map_err(|e| DbtdefsError::Other(e.into()))?;
        ui.message(&yaml);

        Ok(CommandResult::success())
    }
}
