//! Settings file schema.
//!
//! Every field is optional. A missing field keeps the built-in value, so an
//! empty file (or no file) reproduces the fixed deployment layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of `dbtdefs.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Compiled manifest location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,

    /// dbt project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,

    /// Directory containing profiles.yml
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,

    /// Profile name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Node selection expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,

    /// Node exclusion expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Environment used when neither --env nor ENVIRONMENT is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,

    /// dbt executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    /// Turn dbt tests into asset checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_asset_checks: Option<bool>,

    /// Output mode when no CLI flag is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_output: Option<OutputMode>,
}

/// Output verbosity as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Verbose,
    Normal,
    Quiet,
    Silent,
}
