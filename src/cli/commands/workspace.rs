//! Shared loading for commands.
//!
//! Every command that needs definitions goes through [`Workspace::load`]:
//! read settings, apply the settings' output mode, resolve the
//! environment, and build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_settings, Settings};
use crate::dbt::ProcessRunner;
use crate::definitions::{Definitions, DefinitionsBuilder, DefinitionsConfig};
use crate::environment::ResolvedEnvironment;
use crate::error::Result;
use crate::ui::{OutputMode, UserInterface};

/// Where and how to load definitions.
#[derive(Clone, Default)]
pub struct Workspace {
    /// Directory searched for `dbtdefs.yml`.
    pub root: PathBuf,
    /// Explicit settings file (`--config`).
    pub config: Option<PathBuf>,
    /// `--env` flag.
    pub env: Option<String>,
    /// Process runner override; the real dbt is spawned when unset.
    pub runner: Option<Arc<dyn ProcessRunner>>,
    /// ENVIRONMENT value to use instead of the process environment.
    pub variable: Option<Option<String>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    /// Load settings, applying `default_output` when no CLI flag was set.
    pub fn settings(&self, ui: &mut dyn UserInterface) -> Result<Settings> {
        let (settings, paths) = load_settings(&self.root, self.config.as_deref())?;
        for path in paths.all_existing() {
            tracing::debug!("Using settings from {}", path.display());
        }

        if ui.output_mode() == OutputMode::Normal {
            if let Some(mode) = settings.default_output {
                ui.set_output_mode(mode.into());
            }
        }

        Ok(settings)
    }

    /// Resolve the environment against the settings default.
    pub fn environment(&self, settings: &Settings) -> ResolvedEnvironment {
        let default = settings.default_environment.as_deref();
        match &self.variable {
            Some(variable) => ResolvedEnvironment::resolve_with_variable(
                self.env.as_deref(),
                variable.as_deref(),
                default,
            ),
            None => ResolvedEnvironment::resolve(self.env.as_deref(), default),
        }
    }

    /// Build the definitions.
    pub fn load(&self, ui: &mut dyn UserInterface) -> Result<Definitions> {
        let settings = self.settings(ui)?;
        let environment = self.environment(&settings);
        let config = DefinitionsConfig::from_settings(&settings);

        let mut builder = DefinitionsBuilder::new(environment, config);
        if let Some(runner) = &self.runner {
            builder = builder.with_runner(Arc::clone(runner));
        }
        builder.build()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::manifest::fixtures::JAFFLE;
    use std::fs;
    use tempfile::TempDir;

    /// A directory with the jaffle manifest and a settings file pointing at
    /// it. `ENVIRONMENT` is pinned to `variable`.
    pub fn workspace(variable: Option<&str>) -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("manifest.json");
        fs::write(&manifest, JAFFLE).unwrap();
        fs::write(
            temp.path().join("dbtdefs.yml"),
            format!(
                "manifest_path: {}\nexecutable: dbt\n",
                manifest.display()
            ),
        )
        .unwrap();

        let mut ws = Workspace::new(temp.path());
        ws.variable = Some(variable.map(str::to_string));
        (temp, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::workspace;
    use super::*;
    use crate::environment::EnvironmentSource;
    use crate::ui::MockUI;
    use std::fs;

    #[test]
    fn flag_beats_variable() {
        let (_temp, mut ws) = workspace(Some("PROD"));
        ws.env = Some("DEV".into());
        let defs = ws.load(&mut MockUI::new()).unwrap();
        assert_eq!(defs.environment.name, "DEV");
        assert_eq!(defs.environment.source, EnvironmentSource::Flag);
        assert_eq!(defs.dbt().unwrap().config.target, "duckdb_dev");
    }

    #[test]
    fn settings_default_environment_applies() {
        let (temp, ws) = workspace(None);
        let settings = temp.path().join("dbtdefs.local.yml");
        fs::write(settings, "default_environment: PROD\n").unwrap();
        let defs = ws.load(&mut MockUI::new()).unwrap();
        assert_eq!(defs.environment.source, EnvironmentSource::ConfigDefault);
        assert_eq!(defs.dbt().unwrap().config.target, "duckdb_prod");
    }

    #[test]
    fn settings_output_mode_applies_to_normal_ui() {
        let (temp, ws) = workspace(None);
        fs::write(temp.path().join("dbtdefs.local.yml"), "default_output: quiet\n").unwrap();
        let mut ui = MockUI::new();
        ws.settings(&mut ui).unwrap();
        assert_eq!(ui.output_mode(), OutputMode::Quiet);

        let mut verbose = MockUI::with_mode(OutputMode::Verbose);
        ws.settings(&mut verbose).unwrap();
        assert_eq!(verbose.output_mode(), OutputMode::Verbose);
    }
}
