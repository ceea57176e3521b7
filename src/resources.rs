//! Per-environment dbt resource configuration.
//!
//! The table is fixed: three entries, one per [`ConfigTag`]. LOCAL and DEV
//! share the `duckdb_dev` target; PROD writes to `duckdb_prod`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::environment::ConfigTag;

/// Directory holding `dbt_project.yml`.
pub const DBT_PROJECT_DIR: &str = "/opt/dagster/app/location_dbt_layer/";

/// Directory holding `profiles.yml`.
pub const DBT_PROFILES_DIR: &str = "/opt/dagster/app/location_dbt_layer/";

/// Profile name in `profiles.yml`.
pub const DBT_PROFILE: &str = "dbt_core";

/// Target used by LOCAL and DEV.
pub const DEV_TARGET: &str = "duckdb_dev";

/// Target used by PROD.
pub const PROD_TARGET: &str = "duckdb_prod";

/// Connection settings for one dbt invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// `--project-dir`
    pub project_dir: PathBuf,
    /// `--profiles-dir`
    pub profiles_dir: PathBuf,
    /// `--profile`
    pub profile: String,
    /// `--target`
    pub target: String,
}

impl ResourceConfig {
    /// Create a resource config.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        profiles_dir: impl Into<PathBuf>,
        profile: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            profiles_dir: profiles_dir.into(),
            profile: profile.into(),
            target: target.into(),
        }
    }
}

/// Mapping from environment name to resource configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceTable {
    entries: BTreeMap<ConfigTag, ResourceConfig>,
}

impl ResourceTable {
    /// The table with the fixed project/profile directories.
    pub fn builtin() -> Self {
        Self::with_dirs(
            Path::new(DBT_PROJECT_DIR),
            Path::new(DBT_PROFILES_DIR),
            DBT_PROFILE,
        )
    }

    /// The same three targets, with injected directories and profile.
    pub fn with_dirs(project_dir: &Path, profiles_dir: &Path, profile: &str) -> Self {
        let entries = ConfigTag::ALL
            .iter()
            .map(|tag| {
                let target = match tag {
                    ConfigTag::Local | ConfigTag::Dev => DEV_TARGET,
                    ConfigTag::Prod => PROD_TARGET,
                };
                (
                    *tag,
                    ResourceConfig::new(project_dir, profiles_dir, profile, target),
                )
            })
            .collect();
        Self { entries }
    }

    /// Look up by tag. Total over [`ConfigTag`].
    pub fn get(&self, tag: ConfigTag) -> &ResourceConfig {
        // with_dirs fills every tag
        &self.entries[&tag]
    }

    /// Look up by environment name. Unknown names yield `None`.
    pub fn lookup(&self, name: &str) -> Option<&ResourceConfig> {
        let tag = name.parse::<ConfigTag>().ok()?;
        self.entries.get(&tag)
    }

    /// Iterate entries in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigTag, &ResourceConfig)> {
        self.entries.iter()
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolve the built-in resource configuration for a tag.
///
/// # Example
///
/// ```
/// use dbtdefs::environment::ConfigTag;
/// use dbtdefs::resources::resolve_resources;
///
/// assert_eq!(resolve_resources(ConfigTag::Prod).target, "duckdb_prod");
/// assert_eq!(resolve_resources(ConfigTag::Local).target, "duckdb_dev");
/// ```
pub fn resolve_resources(tag: ConfigTag) -> ResourceConfig {
    ResourceTable::builtin().get(tag).clone()
}
