//! The definitions bundle.
//!
//! [`DefinitionsBuilder`] takes a resolved environment and the injected
//! paths, declares the asset definition from the manifest, and pairs it
//! with the `dbt` resource for that environment.
//!
//! # Example
//!
//! ```no_run
//! use dbtdefs::definitions::{DefinitionsBuilder, DefinitionsConfig};
//! use dbtdefs::environment::ResolvedEnvironment;
//!
//! let environment = ResolvedEnvironment::resolve(None, None);
//! let defs = DefinitionsBuilder::new(environment, DefinitionsConfig::default())
//!     .build()
//!     .unwrap();
//! println!("{}", defs.dbt().unwrap().config.target);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::assets::{
    AssetDefinition, ExecutionContext, ASSET_DEFINITION_NAME, DEFAULT_EXCLUDE, DEFAULT_SELECT,
};
use crate::config::Settings;
use crate::dbt::{
    DbtCliInvocation, DbtCliResource, ExecutionEvent, ProcessRunner, RunOutcome, DBT_EXECUTABLE,
    DBT_EXECUTABLE_VAR,
};
use crate::environment::{ConfigTag, ResolvedEnvironment};
use crate::error::{DbtdefsError, Result};
use crate::manifest::MANIFEST_PATH;
use crate::resources::{ResourceTable, DBT_PROFILE, DBT_PROFILES_DIR, DBT_PROJECT_DIR};
use crate::translator::{DefaultTranslator, TranslatorSettings};

/// Key of the dbt resource in [`Definitions::resources`].
pub const DBT_RESOURCE_KEY: &str = "dbt";

/// Paths and names the builder needs. Defaults are the fixed deployment
/// layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionsConfig {
    pub manifest_path: PathBuf,
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub profile: String,
    pub select: String,
    pub exclude: String,
    pub executable: String,
    pub enable_asset_checks: bool,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(MANIFEST_PATH),
            project_dir: PathBuf::from(DBT_PROJECT_DIR),
            profiles_dir: PathBuf::from(DBT_PROFILES_DIR),
            profile: DBT_PROFILE.to_string(),
            select: DEFAULT_SELECT.to_string(),
            exclude: DEFAULT_EXCLUDE.to_string(),
            executable: DBT_EXECUTABLE.to_string(),
            enable_asset_checks: true,
        }
    }
}

impl DefinitionsConfig {
    /// Apply settings on top of the defaults.
    ///
    /// The executable comes from the settings, then `DBT_EXECUTABLE`, then
    /// `dbt`.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        let executable = settings
            .executable
            .clone()
            .or_else(|| std::env::var(DBT_EXECUTABLE_VAR).ok())
            .unwrap_or(defaults.executable);

        Self {
            manifest_path: settings
                .manifest_path
                .clone()
                .unwrap_or(defaults.manifest_path),
            project_dir: settings.project_dir.clone().unwrap_or(defaults.project_dir),
            profiles_dir: settings
                .profiles_dir
                .clone()
                .unwrap_or(defaults.profiles_dir),
            profile: settings.profile.clone().unwrap_or(defaults.profile),
            select: settings.select.clone().unwrap_or(defaults.select),
            exclude: settings.exclude.clone().unwrap_or(defaults.exclude),
            executable,
            enable_asset_checks: settings
                .enable_asset_checks
                .unwrap_or(defaults.enable_asset_checks),
        }
    }
}

/// Everything the host loads: the environment, the assets, and the
/// resources keyed by name.
#[derive(Debug, Clone, Serialize)]
pub struct Definitions {
    pub environment: ResolvedEnvironment,
    pub assets: Vec<AssetDefinition>,
    pub resources: BTreeMap<String, DbtCliResource>,
}

impl Definitions {
    /// The `dbt` resource.
    pub fn dbt(&self) -> Option<&DbtCliResource> {
        self.resources.get(DBT_RESOURCE_KEY)
    }

    /// The manifest-driven asset definition.
    pub fn asset_definition(&self) -> Option<&AssetDefinition> {
        self.assets.iter().find(|a| a.name == ASSET_DEFINITION_NAME)
    }

    /// Prepare the `dbt build` invocation for `context` without running it.
    ///
    /// # Errors
    ///
    /// Fails if the context selects keys the definition does not declare.
    pub fn invocation(&self, context: &ExecutionContext) -> Result<DbtCliInvocation<'_>> {
        let (definition, dbt) = self.parts()?;
        check_selection(definition, context)?;
        Ok(definition.invocation(context, dbt))
    }

    /// Run the asset definition's execution body with the `dbt` resource.
    ///
    /// # Errors
    ///
    /// Fails if the context selects keys the definition does not declare,
    /// or if dbt cannot be started.
    pub fn materialize(
        &self,
        context: &ExecutionContext,
        on_event: impl FnMut(ExecutionEvent),
    ) -> Result<RunOutcome> {
        let (definition, dbt) = self.parts()?;
        check_selection(definition, context)?;
        definition.execute(context, dbt, on_event)
    }

    fn parts(&self) -> Result<(&AssetDefinition, &DbtCliResource)> {
        let definition = self.asset_definition().ok_or_else(|| {
            anyhow::anyhow!("Definitions have no asset named '{}'", ASSET_DEFINITION_NAME)
        })?;
        let dbt = self
            .dbt()
            .ok_or_else(|| anyhow::anyhow!("Definitions have no '{}' resource", DBT_RESOURCE_KEY))?;
        Ok((definition, dbt))
    }
}

fn check_selection(definition: &AssetDefinition, context: &ExecutionContext) -> Result<()> {
    let Some(selected) = &context.selected else {
        return Ok(());
    };
    if selected.is_empty() {
        return Err(DbtdefsError::InvalidSelector {
            selector: String::new(),
            message: "no asset keys selected".to_string(),
        });
    }
    let unknown = definition.unknown_keys(selected);
    if unknown.is_empty() {
        return Ok(());
    }
    let keys: Vec<String> = unknown.iter().map(|k| k.to_string()).collect();
    Err(DbtdefsError::UnknownAsset {
        keys: keys.join(", "),
    })
}

/// Assembles [`Definitions`] for one environment.
pub struct DefinitionsBuilder {
    environment: ResolvedEnvironment,
    config: DefinitionsConfig,
    runner: Option<Arc<dyn ProcessRunner>>,
}

impl DefinitionsBuilder {
    pub fn new(environment: ResolvedEnvironment, config: DefinitionsConfig) -> Self {
        Self {
            environment,
            config,
            runner: None,
        }
    }

    /// Replace how dbt processes are launched.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Resolve resources, then declare assets from the manifest.
    ///
    /// The environment is checked first, so an unknown name fails even
    /// when the manifest is missing.
    pub fn build(self) -> Result<Definitions> {
        let table = ResourceTable::with_dirs(
            &self.config.project_dir,
            &self.config.profiles_dir,
            &self.config.profile,
        );
        let resource_config = table
            .lookup(&self.environment.name)
            .cloned()
            .ok_or_else(|| DbtdefsError::UnknownEnvironment {
                name: self.environment.name.clone(),
                expected: ConfigTag::expected(),
            })?;

        tracing::debug!(
            "Environment {} ({}) uses target '{}'",
            self.environment.name,
            self.environment.source,
            resource_config.target
        );

        let mut dbt = DbtCliResource::new(resource_config, self.config.executable.clone());
        if let Some(runner) = self.runner {
            dbt = dbt.with_runner(runner);
        }

        let translator = DefaultTranslator::new(TranslatorSettings {
            enable_asset_checks: self.config.enable_asset_checks,
        });
        let definition = AssetDefinition::build(
            ASSET_DEFINITION_NAME,
            &self.config.manifest_path,
            &self.config.select,
            &self.config.exclude,
            &translator,
        )?;

        Ok(Definitions {
            environment: self.environment,
            assets: vec![definition],
            resources: BTreeMap::from([(DBT_RESOURCE_KEY.to_string(), dbt)]),
        })
    }
}

/// Keys requested on the command line, parsed as `a/b` paths.
pub fn parse_asset_keys<S: AsRef<str>>(keys: &[S]) -> BTreeSet<crate::assets::AssetKey> {
    keys.iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .map(crate::assets::AssetKey::from_user_string)
        .collect()
}
