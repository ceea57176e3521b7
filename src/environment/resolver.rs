//! Environment resolution.
//!
//! Resolves the active environment name using the priority chain:
//! 1. Explicit `--env` flag
//! 2. `ENVIRONMENT` variable
//! 3. Settings `default_environment`
//! 4. Fallback to LOCAL
//!
//! The resolved name is kept as written. Whether it names a known
//! [`ConfigTag`] is decided by the resource table lookup, not here.

use serde::Serialize;

use super::selector::{ConfigTag, ENVIRONMENT_VAR};
use crate::error::Result;

/// How the environment was determined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentSource {
    /// Explicitly set via `--env` flag.
    Flag,
    /// Read from the `ENVIRONMENT` variable.
    Variable,
    /// Set via settings `default_environment`.
    ConfigDefault,
    /// Nothing set; LOCAL.
    Fallback,
}

impl std::fmt::Display for EnvironmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => write!(f, "--env flag"),
            Self::Variable => write!(f, "{} variable", ENVIRONMENT_VAR),
            Self::ConfigDefault => write!(f, "config default"),
            Self::Fallback => write!(f, "default"),
        }
    }
}

/// A resolved environment with its name and how it was determined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEnvironment {
    /// The environment name as given (e.g., "PROD").
    pub name: String,
    /// How this environment was determined.
    pub source: EnvironmentSource,
}

impl ResolvedEnvironment {
    /// Resolve against the process environment.
    ///
    /// # Example
    ///
    /// ```
    /// use dbtdefs::environment::{EnvironmentSource, ResolvedEnvironment};
    ///
    /// let resolved = ResolvedEnvironment::resolve(Some("DEV"), None);
    /// assert_eq!(resolved.name, "DEV");
    /// assert_eq!(resolved.source, EnvironmentSource::Flag);
    /// ```
    pub fn resolve(flag: Option<&str>, config_default: Option<&str>) -> Self {
        let variable = std::env::var(ENVIRONMENT_VAR).ok();
        Self::resolve_with_variable(flag, variable.as_deref(), config_default)
    }

    /// Resolve with an explicit variable value (for testing).
    pub fn resolve_with_variable(
        flag: Option<&str>,
        variable: Option<&str>,
        config_default: Option<&str>,
    ) -> Self {
        if let Some(name) = flag {
            return Self::named(name, EnvironmentSource::Flag);
        }

        if let Some(name) = variable {
            return Self::named(name, EnvironmentSource::Variable);
        }

        if let Some(name) = config_default {
            return Self::named(name, EnvironmentSource::ConfigDefault);
        }

        Self::named(ConfigTag::Local.as_str(), EnvironmentSource::Fallback)
    }

    /// An environment resolved from a known tag.
    pub fn from_tag(tag: ConfigTag, source: EnvironmentSource) -> Self {
        Self::named(tag.as_str(), source)
    }

    /// Parse the resolved name as a [`ConfigTag`].
    pub fn tag(&self) -> Result<ConfigTag> {
        self.name.parse()
    }

    fn named(name: &str, source: EnvironmentSource) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }
}
