//! The environment selector tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DbtdefsError, Result};

/// Variable the deployment environment is read from.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// A deployment environment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigTag {
    /// Developer machine.
    #[default]
    Local,
    /// Shared development deployment.
    Dev,
    /// Production deployment.
    Prod,
}

impl ConfigTag {
    /// Every known tag, in table order.
    pub const ALL: [ConfigTag; 3] = [ConfigTag::Local, ConfigTag::Dev, ConfigTag::Prod];

    /// The tag as it appears in the environment variable.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigTag::Local => "LOCAL",
            ConfigTag::Dev => "DEV",
            ConfigTag::Prod => "PROD",
        }
    }

    /// Comma-separated list of known tags, for error messages.
    pub fn expected() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ConfigTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigTag {
    type Err = DbtdefsError;

    /// Tags are matched exactly; `prod` is not `PROD`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LOCAL" => Ok(ConfigTag::Local),
            "DEV" => Ok(ConfigTag::Dev),
            "PROD" => Ok(ConfigTag::Prod),
            other => Err(DbtdefsError::UnknownEnvironment {
                name: other.to_string(),
                expected: Self::expected(),
            }),
        }
    }
}

/// Read the environment tag from the process environment.
///
/// An unset variable selects LOCAL. An unrecognized value is an error
/// rather than a silent fallback.
pub fn select_environment() -> Result<ConfigTag> {
    let value = std::env::var(ENVIRONMENT_VAR).ok();
    select_environment_from(value.as_deref())
}

/// Injectable form of [`select_environment`].
///
/// # Example
///
/// ```
/// use dbtdefs::environment::{select_environment_from, ConfigTag};
///
/// assert_eq!(select_environment_from(None).unwrap(), ConfigTag::Local);
/// assert_eq!(select_environment_from(Some("PROD")).unwrap(), ConfigTag::Prod);
/// assert!(select_environment_from(Some("STAGING")).is_err());
/// ```
pub fn select_environment_from(value: Option<&str>) -> Result<ConfigTag> {
    match value {
        None => Ok(ConfigTag::Local),
        Some(v) => v.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_selects_local() {
        assert_eq!(select_environment_from(None).unwrap(), ConfigTag::Local);
    }

    #[test]
    fn known_tags_parse() {
        assert_eq!("LOCAL".parse::<ConfigTag>().unwrap(), ConfigTag::Local);
        assert_eq!("DEV".parse::<ConfigTag>().unwrap(), ConfigTag::Dev);
        assert_eq!("PROD".parse::<ConfigTag>().unwrap(), ConfigTag::Prod);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = select_environment_from(Some("STAGING")).unwrap_err();
        assert!(matches!(
            err,
            DbtdefsError::UnknownEnvironment { ref name, .. } if name == "STAGING"
        ));
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!("prod".parse::<ConfigTag>().is_err());
    }

    #[test]
    fn empty_value_is_not_absent() {
        assert!(select_environment_from(Some("")).is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for tag in ConfigTag::ALL {
            assert_eq!(tag.to_string().parse::<ConfigTag>().unwrap(), tag);
        }
    }

    #[test]
    fn expected_lists_all_tags() {
        assert_eq!(ConfigTag::expected(), "LOCAL, DEV, PROD");
    }

    #[test]
    fn default_is_local() {
        assert_eq!(ConfigTag::default(), ConfigTag::Local);
    }
}
