//! Asset keys, specs, and checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path-like identifier of an asset, e.g. `marts/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(pub Vec<String>);

impl AssetKey {
    /// Build a key from path components.
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(components.into_iter().map(Into::into).collect())
    }

    /// Parse the `a/b/c` form used on the command line.
    pub fn from_user_string(s: &str) -> Self {
        Self::new(s.split('/').filter(|c| !c.is_empty()))
    }

    /// Path components.
    pub fn path(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// One materializable dbt node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSpec {
    pub key: AssetKey,
    pub unique_id: String,
    /// dbt fqn, used to select the node when running a subset.
    pub fqn: Vec<String>,
    pub resource_type: String,
    /// Upstream assets (models, seeds, snapshots, sources).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<AssetKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A dbt test attached to an asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetCheckSpec {
    pub name: String,
    pub asset_key: AssetKey,
    pub unique_id: String,
}
