//! Asset declarations built from the dbt manifest.
//!
//! - [`spec`] - Asset keys, specs, and checks
//! - [`definition`] - The asset group and its execution body
//! - [`context`] - Per-run execution context

pub mod context;
pub mod definition;
pub mod spec;

pub use context::{ExecutionContext, RunId};
pub use definition::{
    build_asset_definition, AssetDefinition, ASSET_DEFINITION_NAME, DEFAULT_EXCLUDE,
    DEFAULT_SELECT,
};
pub use spec::{AssetCheckSpec, AssetKey, AssetSpec};
