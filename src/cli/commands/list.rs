//! List command implementation.
//!
//! The `dbtdefs list` command lists the declared assets and their checks.

use serde::Serialize;

use crate::assets::{AssetCheckSpec, AssetKey};
use crate::cli::args::ListArgs;
use crate::error::{DbtdefsError, Result};
use crate::ui::theme::Theme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::workspace::Workspace;

/// The list command implementation.
pub struct ListCommand {
    workspace: Workspace,
    args: ListArgs,
}

#[derive(Serialize)]
struct ListedAsset<'a> {
    key: &'a AssetKey,
    unique_id: &'a str,
    resource_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    deps: &'a [AssetKey],
    checks: Vec<&'a str>,
}

impl ListCommand {
    pub fn new(workspace: &Workspace, args: ListArgs) -> Self {
        Self {
            workspace: workspace.clone(),
            args,
        }
    }

    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

fn checks_for<'a>(checks: &'a [AssetCheckSpec], key: &AssetKey) -> Vec<&'a str> {
    checks
        .iter()
        .filter(|c| &c.asset_key == key)
        .map(|c| c.name.as_str())
        .collect()
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let defs = self.workspace.load(ui)?;
        let Some(definition) = defs.asset_definition() else {
            ui.error("No asset definition was declared");
            return Ok(CommandResult::failure(1));
        };

        if self.args.json {
            let listed: Vec<ListedAsset<'_>> = definition
                .specs
                .iter()
                .map(|spec| ListedAsset {
                    key: &spec.key,
                    unique_id: &spec.unique_id,
                    resource_type: &spec.resource_type,
                    group: spec.group.as_deref(),
                    deps: &spec.deps,
                    checks: checks_for(&definition.checks, &spec.key),
                })
                .collect();
            let json =
                serde_json::to_string_pretty(&listed).map_err(|e| DbtdefsError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        let theme = Theme::new();
        ui.message(&format!(
            "  {} {}",
            theme.key.apply_to(format!("{}:", definition.name)),
            theme.dim.apply_to(format!(
                "{} assets, {} checks",
                definition.specs.len(),
                definition.checks.len()
            ))
        ));

        for spec in &definition.specs {
            let group = spec
                .group
                .as_deref()
                .map(|g| format!(" {}", theme.dim.apply_to(format!("(group: {})", g))))
                .unwrap_or_default();
            ui.message(&format!(
                "    {} {}{}",
                theme.highlight.apply_to(&spec.key),
                theme.dim.apply_to(&spec.resource_type),
                group
            ));

            if let Some(desc) = &spec.description {
                ui.message(&format!("      {}", theme.dim.apply_to(desc)));
            }

            if !spec.deps.is_empty() {
                let deps: Vec<String> = spec.deps.iter().map(|d| d.to_string()).collect();
                ui.message(&format!(
                    "      {} {}",
                    theme.dim.apply_to("└── depends on:"),
                    theme.dim.apply_to(deps.join(", "))
                ));
            }

            for check in checks_for(&definition.checks, &spec.key) {
                ui.message(&format!("      {} {}", theme.dim.apply_to("check:"), check));
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::workspace::testing::workspace;
    use crate::ui::MockUI;

    #[test]
    fn lists_assets_without_daily_partition() {
        let (_temp, ws) = workspace(None);
        let cmd = ListCommand::new(&ws, ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("non_partitioned_dbt_assets"));
        assert!(ui.has_message("stg_orders"));
        assert!(ui.has_message("raw_orders"));
        assert!(ui.has_message("not_null_orders_order_id"));
        assert!(!ui.has_message("orders_daily"));
    }

    #[test]
    fn json_output_lists_keys() {
        let (_temp, ws) = workspace(None);
        let cmd = ListCommand::new(&ws, ListArgs { json: true });
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let json: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["key"], serde_json::json!(["marts", "orders"]));
        assert_eq!(json[0]["checks"], serde_json::json!(["not_null_orders_order_id"]));
    }

    #[test]
    fn unknown_environment_is_an_error() {
        let (_temp, ws) = workspace(Some("STAGING"));
        let cmd = ListCommand::new(&ws, ListArgs::default());
        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(matches!(err, DbtdefsError::UnknownEnvironment { .. }));
    }
}
