//! Settings file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::merger::merge_layers;
use crate::config::schema::Settings;
use crate::error::{DbtdefsError, Result};

/// Project settings file name.
pub const SETTINGS_FILE: &str = "dbtdefs.yml";

/// Uncommitted local overrides, layered on top.
pub const LOCAL_SETTINGS_FILE: &str = "dbtdefs.local.yml";

/// Settings files in merge order (later overrides earlier).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPaths {
    /// `dbtdefs.yml`, or the file given with `--config`
    pub project: Option<PathBuf>,

    /// `dbtdefs.local.yml` next to it
    pub local: Option<PathBuf>,
}

impl SettingsPaths {
    /// Discover settings files in `dir`.
    pub fn discover(dir: &Path) -> Self {
        Self {
            project: existing(dir.join(SETTINGS_FILE)),
            local: existing(dir.join(LOCAL_SETTINGS_FILE)),
        }
    }

    /// Existing paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.local.iter()).collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

/// Parse YAML content into Settings.
///
/// `source_path` is only used for error reporting.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| DbtdefsError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

fn load_value(path: &Path) -> Result<Option<serde_yaml::Value>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DbtdefsError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DbtdefsError::Io(e)
        }
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| DbtdefsError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load settings.
///
/// With `explicit`, only that file is read and it must exist. Otherwise
/// `dbtdefs.yml` and `dbtdefs.local.yml` in `dir` are merged; neither is
/// required.
pub fn load_settings(dir: &Path, explicit: Option<&Path>) -> Result<(Settings, SettingsPaths)> {
    let paths = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(DbtdefsError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            SettingsPaths {
                project: Some(path.to_path_buf()),
                local: None,
            }
        }
        None => SettingsPaths::discover(dir),
    };

    let mut layers = Vec::new();
    for path in paths.all_existing() {
        if let Some(value) = load_value(path)? {
            layers.push(value);
        }
    }

    if layers.is_empty() {
        tracing::debug!("No settings files found in {}", dir.display());
        return Ok((Settings::default(), paths));
    }

    let merged = merge_layers(&layers);
    let source = paths
        .project
        .clone()
        .or_else(|| paths.local.clone())
        .unwrap_or_else(|| dir.join(SETTINGS_FILE));

    let settings =
        serde_yaml::from_value(merged).map_err(|e| DbtdefsError::ConfigParseError {
            path: source,
            message: e.to_string(),
        })?;

    tracing::debug!("Loaded settings: {:?}", settings);
    Ok((settings, paths))
}
