//! The dbt CLI resource.
//!
//! A [`DbtCliResource`] knows which project, profile, and target to run
//! against and how to launch dbt. Calling [`DbtCliResource::cli`] builds
//! the complete argument vector for one invocation; streaming it relays
//! every line dbt prints, in order, as an [`ExecutionEvent`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::events::{EventClassifier, EventKind, ExecutionEvent};
use super::process::{CommandSpec, ProcessRunner, SystemRunner};
use crate::assets::{AssetDefinition, AssetKey, ExecutionContext};
use crate::error::Result;
use crate::resources::ResourceConfig;

/// Default dbt executable.
pub const DBT_EXECUTABLE: &str = "dbt";

/// Variable that overrides the dbt executable.
pub const DBT_EXECUTABLE_VAR: &str = "DBT_EXECUTABLE";

/// Executes dbt CLI commands for one environment.
#[derive(Clone, Serialize)]
pub struct DbtCliResource {
    #[serde(flatten)]
    pub config: ResourceConfig,
    pub executable: String,
    #[serde(skip)]
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for DbtCliResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbtCliResource")
            .field("config", &self.config)
            .field("executable", &self.executable)
            .finish_non_exhaustive()
    }
}

impl DbtCliResource {
    /// Create a resource that spawns the real `executable`.
    pub fn new(config: ResourceConfig, executable: impl Into<String>) -> Self {
        Self {
            config,
            executable: executable.into(),
            runner: Arc::new(SystemRunner),
        }
    }

    /// Replace how processes are launched.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// `--project-dir` and `--profiles-dir` flags for this resource.
    pub fn project_args(&self) -> Vec<String> {
        vec![
            "--project-dir".to_string(),
            self.config.project_dir.display().to_string(),
            "--profiles-dir".to_string(),
            self.config.profiles_dir.display().to_string(),
        ]
    }

    /// Prepare an invocation of `args` for the assets of `definition`.
    ///
    /// The final argument vector is: `args`, then `--profile`/`--target`,
    /// then `--log-format json`, then the selection. A subset context
    /// selects the chosen assets by fqn; otherwise the definition's own
    /// select/exclude expressions are passed through.
    pub fn cli<'a, S: AsRef<str>>(
        &'a self,
        args: &[S],
        context: &ExecutionContext,
        definition: &'a AssetDefinition,
    ) -> DbtCliInvocation<'a> {
        let mut full: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        full.extend([
            "--profile".to_string(),
            self.config.profile.clone(),
            "--target".to_string(),
            self.config.target.clone(),
            "--log-format".to_string(),
            "json".to_string(),
        ]);
        full.extend(selection_args(context, definition));

        let spec = CommandSpec {
            program: self.executable.clone(),
            args: full,
            cwd: Some(self.config.project_dir.clone()),
            ..Default::default()
        };

        tracing::debug!("Prepared dbt invocation: {}", spec.display());

        DbtCliInvocation {
            spec,
            runner: self.runner.as_ref(),
            classifier: EventClassifier::new(definition),
        }
    }
}

fn selection_args(context: &ExecutionContext, definition: &AssetDefinition) -> Vec<String> {
    let subset: Vec<String> = match &context.selected {
        Some(keys) => definition
            .specs
            .iter()
            .filter(|s| keys.contains(&s.key))
            .map(|s| format!("fqn:{}", s.fqn.join(".")))
            .collect(),
        None => Vec::new(),
    };
    if context.selected.is_some() && subset.is_empty() {
        tracing::warn!(
            "Subset matched no assets of '{}'; using its full selection",
            definition.name
        );
    }

    let mut args = Vec::new();
    if !subset.is_empty() {
        args.push("--select".to_string());
        args.push(subset.join(" "));
    } else if !definition.select.trim().is_empty() {
        args.push("--select".to_string());
        args.push(definition.select.clone());
    }
    // The exclude applies to subsets too.
    if !definition.exclude.trim().is_empty() {
        args.push("--exclude".to_string());
        args.push(definition.exclude.clone());
    }
    args
}

/// Summary of a finished dbt invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// dbt's exit code (None if killed by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Number of lines relayed.
    pub events: usize,
    /// Assets that materialized, in completion order.
    pub materialized: Vec<AssetKey>,
    /// Checks that did not pass.
    pub failed_checks: Vec<String>,
    /// Nodes that finished without success.
    pub failed_nodes: Vec<String>,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// A prepared dbt invocation.
pub struct DbtCliInvocation<'a> {
    spec: CommandSpec,
    runner: &'a dyn ProcessRunner,
    classifier: EventClassifier<'a>,
}

impl fmt::Debug for DbtCliInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbtCliInvocation")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl DbtCliInvocation<'_> {
    /// The command that will run.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Run dbt and hand every event to `on_event` as it arrives.
    ///
    /// A non-zero dbt exit is reported on the outcome, not as an error.
    pub fn stream(self, mut on_event: impl FnMut(ExecutionEvent)) -> Result<RunOutcome> {
        let mut events = 0usize;
        let mut materialized = Vec::new();
        let mut failed_checks = Vec::new();
        let mut failed_nodes = Vec::new();

        let classifier = &self.classifier;
        let result = self.runner.run_streaming(&self.spec, &mut |line| {
            let event = classifier.classify(line);
            events += 1;
            match &event.kind {
                EventKind::Materialization { asset_key, .. } => {
                    materialized.push(asset_key.clone())
                }
                EventKind::CheckEvaluation {
                    check_name, passed, ..
                } if !passed => failed_checks.push(check_name.clone()),
                EventKind::NodeFailed { unique_id, .. } => failed_nodes.push(unique_id.clone()),
                _ => {}
            }
            on_event(event);
        })?;

        Ok(RunOutcome {
            exit_code: result.exit_code,
            success: result.success,
            duration: result.duration,
            events,
            materialized,
            failed_checks,
            failed_nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbt::process::{CommandResult, OutputLine};
    use crate::manifest::fixtures::JAFFLE;
    use crate::manifest::Manifest;
    use crate::resources::{resolve_resources, ResourceTable};
    use crate::environment::ConfigTag;
    use crate::translator::DefaultTranslator;
    use std::path::Path;
    use std::sync::Mutex;

    struct Replay {
        lines: Vec<OutputLine>,
        exit_code: i32,
        seen: Mutex<Vec<CommandSpec>>,
    }

    impl ProcessRunner for Replay {
        fn run_streaming(
            &self,
            spec: &CommandSpec,
            on_line: &mut dyn FnMut(OutputLine),
        ) -> Result<CommandResult> {
            self.seen.lock().unwrap().push(spec.clone());
            for line in &self.lines {
                on_line(line.clone());
            }
            Ok(CommandResult::from_code(
                Some(self.exit_code),
                Duration::from_millis(5),
            ))
        }
    }

    fn definition() -> AssetDefinition {
        let manifest = Manifest::parse(JAFFLE, Path::new("manifest.json")).unwrap();
        AssetDefinition::from_manifest(
            "non_partitioned_dbt_assets",
            Path::new("manifest.json"),
            &manifest,
            "fqn:*",
            "tag:daily_partition",
            &DefaultTranslator::default(),
        )
        .unwrap()
    }

    fn finished(id: &str, status: &str) -> OutputLine {
        OutputLine::Stdout(
            serde_json::json!({
                "info": {"name": "NodeFinished", "level": "debug", "msg": ""},
                "data": {"node_info": {"unique_id": id, "node_status": status}}
            })
            .to_string(),
        )
    }

    #[test]
    fn full_run_passes_definition_selection() {
        let def = definition();
        let dbt = DbtCliResource::new(resolve_resources(ConfigTag::Prod), "dbt");
        let args = ["build"];
        let inv = dbt.cli(&args, &ExecutionContext::new(), &def);
        let spec = inv.spec();
        assert_eq!(spec.program, "dbt");
        assert_eq!(
            spec.args,
            vec![
                "build",
                "--profile",
                "dbt_core",
                "--target",
                "duckdb_prod",
                "--log-format",
                "json",
                "--select",
                "fqn:*",
                "--exclude",
                "tag:daily_partition",
            ]
        );
        assert_eq!(spec.cwd, Some(dbt.config.project_dir.clone()));
    }

    #[test]
    fn subset_run_selects_by_fqn() {
        let def = definition();
        let dbt = DbtCliResource::new(ResourceTable::builtin().get(ConfigTag::Dev).clone(), "dbt");
        let ctx = ExecutionContext::with_selection([AssetKey::new(["stg_orders"])]);
        let inv = dbt.cli(&["build"], &ctx, &def);
        let args = &inv.spec().args;
        let pos = args.iter().position(|a| a == "--select").unwrap();
        assert_eq!(args[pos + 1], "fqn:jaffle_shop.staging.stg_orders");
        let pos = args.iter().position(|a| a == "--exclude").unwrap();
        assert_eq!(args[pos + 1], "tag:daily_partition");
    }

    #[test]
    fn empty_subset_keeps_definition_selection() {
        let def = definition();
        let dbt = DbtCliResource::new(resolve_resources(ConfigTag::Local), "dbt");
        let keys = crate::definitions::parse_asset_keys(&["", " "]);
        let ctx = ExecutionContext::with_selection(keys);
        let inv = dbt.cli(&["build"], &ctx, &def);
        assert_eq!(
            inv.spec().args[7..],
            ["--select", "fqn:*", "--exclude", "tag:daily_partition"]
        );
    }

    #[test]
    fn project_args_use_config_dirs() {
        let dbt = DbtCliResource::new(resolve_resources(ConfigTag::Local), "dbt");
        assert_eq!(
            dbt.project_args(),
            vec![
                "--project-dir",
                "/opt/dagster/app/location_dbt_layer/",
                "--profiles-dir",
                "/opt/dagster/app/location_dbt_layer/",
            ]
        );
    }

    #[test]
    fn stream_relays_every_line_in_order() {
        let def = definition();
        let lines = vec![
            OutputLine::Stdout("plain text".into()),
            finished("seed.jaffle_shop.raw_orders", "success"),
            finished("model.jaffle_shop.stg_orders", "success"),
            finished("test.jaffle_shop.not_null_orders_order_id.abc123", "fail"),
            finished("model.jaffle_shop.orders", "error"),
        ];
        let runner = Arc::new(Replay {
            lines: lines.clone(),
            exit_code: 1,
            seen: Mutex::new(Vec::new()),
        });
        let dbt = DbtCliResource::new(resolve_resources(ConfigTag::Local), "dbt")
            .with_runner(runner.clone());

        let mut relayed = Vec::new();
        let outcome = dbt
            .cli(&["build"], &ExecutionContext::new(), &def)
            .stream(|e| relayed.push(e))
            .unwrap();

        let raw: Vec<OutputLine> = relayed.iter().map(|e| e.line.clone()).collect();
        assert_eq!(raw, lines);
        assert_eq!(outcome.events, 5);
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(
            outcome.materialized,
            vec![AssetKey::new(["raw_orders"]), AssetKey::new(["stg_orders"])]
        );
        assert_eq!(outcome.failed_checks, vec!["not_null_orders_order_id"]);
        assert_eq!(outcome.failed_nodes, vec!["model.jaffle_shop.orders"]);
        assert_eq!(runner.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn debug_omits_runner() {
        let dbt = DbtCliResource::new(resolve_resources(ConfigTag::Local), "dbt");
        let dbg = format!("{:?}", dbt);
        assert!(dbg.contains("duckdb_dev"));
    }
}
