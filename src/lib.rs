//! dbtdefs - Environment-scoped dbt asset definitions.
//!
//! Reads a compiled dbt manifest, declares the selected models, seeds, and
//! snapshots as assets (with dbt tests as asset checks), and pairs them
//! with a dbt CLI resource chosen by the `ENVIRONMENT` variable. The
//! execution body runs `dbt build` and relays every event dbt streams.
//!
//! # Modules
//!
//! - [`assets`] - Asset keys, specs, the asset definition and its execution body
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings file loading and layering
//! - [`dbt`] - The dbt CLI resource, process runner, and event stream
//! - [`definitions`] - The definitions bundle and its builder
//! - [`environment`] - Environment selection and resolution
//! - [`error`] - Error types and result aliases
//! - [`manifest`] - dbt `manifest.json` model
//! - [`resources`] - Per-environment resource table
//! - [`selection`] - dbt node selection expressions
//! - [`translator`] - Manifest node to asset mapping
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use dbtdefs::environment::select_environment_from;
//! use dbtdefs::resources::resolve_resources;
//!
//! let tag = select_environment_from(Some("PROD")).unwrap();
//! let resources = resolve_resources(tag);
//! assert_eq!(resources.profile, "dbt_core");
//! assert_eq!(resources.target, "duckdb_prod");
//! ```
//!
//! For the full bundle, see [`definitions::DefinitionsBuilder`].

pub mod assets;
pub mod cli;
pub mod config;
pub mod dbt;
pub mod definitions;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod resources;
pub mod selection;
pub mod translator;
pub mod ui;

pub use definitions::{Definitions, DefinitionsBuilder, DefinitionsConfig};
pub use error::{DbtdefsError, Result};
