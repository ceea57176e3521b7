//! Settings for the definitions builder.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layering in [`merger`]
//!
//! # Settings File Locations
//!
//! Settings are read from the working directory and merged in this order:
//! 1. `dbtdefs.yml`
//! 2. `dbtdefs.local.yml`
//!
//! Both are optional. `--config <file>` reads a single file instead.
//!
//! # Example
//!
//! ```
//! use dbtdefs::config::load_settings;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("dbtdefs.yml"), "profile: analytics").unwrap();
//!
//! let (settings, _) = load_settings(temp.path(), None).unwrap();
//! assert_eq!(settings.profile.as_deref(), Some("analytics"));
//! ```

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{load_settings, parse_settings, SettingsPaths, LOCAL_SETTINGS_FILE, SETTINGS_FILE};
pub use merger::{deep_merge, merge_layers};
pub use schema::{OutputMode, Settings};
