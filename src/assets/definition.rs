//! Manifest-driven asset definitions.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::context::ExecutionContext;
use super::spec::{AssetCheckSpec, AssetKey, AssetSpec};
use crate::dbt::{DbtCliInvocation, DbtCliResource, ExecutionEvent, RunOutcome};
use crate::error::Result;
use crate::manifest::{Manifest, ResourceType};
use crate::selection::select_unique_ids;
use crate::translator::{AssetTranslator, DefaultTranslator};

/// Name of the definition built from the project manifest.
pub const ASSET_DEFINITION_NAME: &str = "non_partitioned_dbt_assets";

/// Default selection: every node.
pub const DEFAULT_SELECT: &str = "fqn:*";

/// Default exclusion: partitioned models run elsewhere.
pub const DEFAULT_EXCLUDE: &str = "tag:daily_partition";

/// A group of assets declared from one manifest and a select/exclude pair.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDefinition {
    pub name: String,
    pub manifest_path: PathBuf,
    pub select: String,
    pub exclude: String,
    pub specs: Vec<AssetSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<AssetCheckSpec>,
}

/// Declare the asset group for a manifest with the default translator.
///
/// # Errors
///
/// Fails if the manifest is missing or malformed, or if either
/// expression does not parse.
pub fn build_asset_definition(
    manifest_path: &Path,
    select: &str,
    exclude: &str,
) -> Result<AssetDefinition> {
    AssetDefinition::build(
        ASSET_DEFINITION_NAME,
        manifest_path,
        select,
        exclude,
        &DefaultTranslator::default(),
    )
}

impl AssetDefinition {
    /// Load the manifest and declare the asset group.
    pub fn build(
        name: &str,
        manifest_path: &Path,
        select: &str,
        exclude: &str,
        translator: &dyn AssetTranslator,
    ) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        Self::from_manifest(name, manifest_path, &manifest, select, exclude, translator)
    }

    /// Declare the asset group from an already-parsed manifest.
    pub fn from_manifest(
        name: &str,
        manifest_path: &Path,
        manifest: &Manifest,
        select: &str,
        exclude: &str,
        translator: &dyn AssetTranslator,
    ) -> Result<Self> {
        let selected = select_unique_ids(manifest, select, exclude)?;

        let mut specs = Vec::new();
        for unique_id in &selected {
            let Some(node) = manifest.node(unique_id) else {
                continue;
            };
            if !node.resource_type.is_asset() {
                continue;
            }

            let deps = node
                .depends_on
                .nodes
                .iter()
                .filter_map(|id| manifest.node(id))
                .filter(|dep| {
                    dep.resource_type.is_asset() || dep.resource_type == ResourceType::Source
                })
                .map(|dep| translator.asset_key(dep))
                .collect();

            specs.push(AssetSpec {
                key: translator.asset_key(node),
                unique_id: node.unique_id.clone(),
                fqn: node.fqn.clone(),
                resource_type: node.resource_type.to_string(),
                deps,
                group: translator.group_name(node),
                description: translator.description(node),
                tags: node.all_tags().into_iter().map(str::to_string).collect(),
            });
        }

        let mut checks = Vec::new();
        if translator.settings().enable_asset_checks {
            for spec in &specs {
                for test in manifest.tests_for(&spec.unique_id) {
                    if !test.config.enabled || !selected.contains(&test.unique_id) {
                        continue;
                    }
                    checks.push(AssetCheckSpec {
                        name: translator.check_name(test),
                        asset_key: spec.key.clone(),
                        unique_id: test.unique_id.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            "Declared '{}' with {} assets and {} checks",
            name,
            specs.len(),
            checks.len()
        );

        Ok(Self {
            name: name.to_string(),
            manifest_path: manifest_path.to_path_buf(),
            select: select.to_string(),
            exclude: exclude.to_string(),
            specs,
            checks,
        })
    }

    /// Asset keys in declaration order.
    pub fn keys(&self) -> Vec<&AssetKey> {
        self.specs.iter().map(|s| &s.key).collect()
    }

    /// Whether the definition declares `key`.
    pub fn contains_key(&self, key: &AssetKey) -> bool {
        self.specs.iter().any(|s| &s.key == key)
    }

    /// Find the spec for a dbt unique id.
    pub fn spec_by_unique_id(&self, unique_id: &str) -> Option<&AssetSpec> {
        self.specs.iter().find(|s| s.unique_id == unique_id)
    }

    /// Find the check for a dbt test unique id.
    pub fn check_by_unique_id(&self, unique_id: &str) -> Option<&AssetCheckSpec> {
        self.checks.iter().find(|c| c.unique_id == unique_id)
    }

    /// Keys in `requested` that this definition does not declare.
    pub fn unknown_keys<'k>(&self, requested: &'k BTreeSet<AssetKey>) -> Vec<&'k AssetKey> {
        requested.iter().filter(|k| !self.contains_key(k)).collect()
    }

    /// The `dbt build` invocation for these assets, not yet started.
    pub fn invocation<'a>(
        &'a self,
        context: &ExecutionContext,
        dbt: &'a DbtCliResource,
    ) -> DbtCliInvocation<'a> {
        let mut args = vec!["build".to_string()];
        args.extend(dbt.project_args());
        dbt.cli(&args, context, self)
    }

    /// The execution body: run `dbt build` for these assets and relay
    /// every streamed event to `on_event`.
    pub fn execute(
        &self,
        context: &ExecutionContext,
        dbt: &DbtCliResource,
        on_event: impl FnMut(ExecutionEvent),
    ) -> Result<RunOutcome> {
        tracing::info!(
            "Materializing '{}' (run {}, target {})",
            self.name,
            context.run_id,
            dbt.config.target
        );

        let outcome = self.invocation(context, dbt).stream(on_event)?;

        tracing::info!(
            "dbt finished with exit code {:?} after {} events",
            outcome.exit_code,
            outcome.events
        );
        Ok(outcome)
    }
}
