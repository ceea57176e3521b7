//! Error types for dbtdefs operations.
//!
//! This module defines [`DbtdefsError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! Nothing here is recovered locally. The variants only exist so the host can
//! say *which* of the failure points was hit:
//!
//! - manifest unreadable or malformed
//! - environment selector not in the resource table
//! - dbt could not be spawned
//!
//! A dbt run that starts and exits non-zero is not an error value; its events
//! are relayed and the exit code is carried on the run outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dbtdefs operations.
#[derive(Debug, Error)]
pub enum DbtdefsError {
    /// Manifest file not found at expected location.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// Manifest file exists but could not be parsed.
    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParseError { path: PathBuf, message: String },

    /// Environment selector has no entry in the resource table.
    #[error("Unknown environment '{name}' (expected one of: {expected})")]
    UnknownEnvironment { name: String, expected: String },

    /// Selection expression could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Requested asset keys are not declared by the definition.
    #[error("Unknown asset key(s): {keys}")]
    UnknownAsset { keys: String },

    /// Settings file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse settings file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// The dbt executable could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for dbtdefs operations.
pub type Result<T> = std::result::Result<T, DbtdefsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_displays_path() {
        let err = DbtdefsError::ManifestNotFound {
            path: PathBuf::from("/opt/project/target/manifest.json"),
        };
        assert!(err
            .to_string()
            .contains("/opt/project/target/manifest.json"));
    }

    #[test]
    fn manifest_parse_error_displays_path_and_message() {
        let err = DbtdefsError::ManifestParseError {
            path: PathBuf::from("/manifest.json"),
            message: "expected value at line 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/manifest.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn unknown_environment_lists_expected_tags() {
        let err = DbtdefsError::UnknownEnvironment {
            name: "STAGING".into(),
            expected: "LOCAL, DEV, PROD".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("STAGING"));
        assert!(msg.contains("LOCAL, DEV, PROD"));
    }

    #[test]
    fn invalid_selector_displays_selector() {
        let err = DbtdefsError::InvalidSelector {
            selector: "bogus:x".into(),
            message: "unknown method 'bogus'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bogus:x"));
        assert!(msg.contains("unknown method"));
    }

    #[test]
    fn unknown_asset_lists_keys() {
        let err = DbtdefsError::UnknownAsset {
            keys: "orders_daily, nope".into(),
        };
        assert!(err.to_string().contains("orders_daily, nope"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = DbtdefsError::CommandFailed {
            command: "dbt build".into(),
            code: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("dbt build"));
        assert!(msg.contains("None"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: DbtdefsError = io_err.into();
        assert!(matches!(err, DbtdefsError::Io(_)));
    }

    #[test]
    fn anyhow_error_is_transparent() {
        let err: DbtdefsError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
