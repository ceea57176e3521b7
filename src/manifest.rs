//! dbt `manifest.json` loading.
//!
//! Only the subset of the manifest needed to declare assets is modelled:
//! node identity, fqn, tags, config, and dependency edges. Unknown fields
//! are ignored so newer dbt versions keep loading.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DbtdefsError, Result};

/// Default location of the compiled manifest.
pub const MANIFEST_PATH: &str = "/opt/dagster/app/location_dbt_layer/target/manifest.json";

/// A parsed dbt manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Manifest metadata
    pub metadata: ManifestMetadata,

    /// Models, seeds, snapshots, tests, analyses, operations
    pub nodes: BTreeMap<String, ManifestNode>,

    /// Source tables
    pub sources: BTreeMap<String, ManifestNode>,
}

/// Manifest header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbt_schema_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbt_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Kind of manifest node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Model,
    Seed,
    Snapshot,
    Test,
    Source,
    Analysis,
    Operation,
    SqlOperation,
    Exposure,
    Metric,
    SemanticModel,
    SavedQuery,
    UnitTest,
    #[serde(other)]
    Other,
}

impl ResourceType {
    /// Whether nodes of this type materialize data.
    pub fn is_asset(&self) -> bool {
        matches!(
            self,
            ResourceType::Model | ResourceType::Seed | ResourceType::Snapshot
        )
    }

    /// The name dbt uses for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Model => "model",
            ResourceType::Seed => "seed",
            ResourceType::Snapshot => "snapshot",
            ResourceType::Test => "test",
            ResourceType::Source => "source",
            ResourceType::Analysis => "analysis",
            ResourceType::Operation => "operation",
            ResourceType::SqlOperation => "sql_operation",
            ResourceType::Exposure => "exposure",
            ResourceType::Metric => "metric",
            ResourceType::SemanticModel => "semantic_model",
            ResourceType::SavedQuery => "saved_query",
            ResourceType::UnitTest => "unit_test",
            ResourceType::Other => "other",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `nodes` or `sources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestNode {
    pub unique_id: String,

    pub resource_type: ResourceType,

    pub name: String,

    #[serde(default)]
    pub package_name: String,

    /// Fully-qualified name, package first.
    #[serde(default)]
    pub fqn: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub config: NodeConfig,

    #[serde(default)]
    pub depends_on: DependsOn,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<serde_json::Value>,

    /// Sources only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Tests only: the node a generic test is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_node: Option<String>,
}

impl ManifestNode {
    /// Dotted fqn, e.g. `jaffle_shop.staging.stg_orders`.
    pub fn fqn_path(&self) -> String {
        self.fqn.join(".")
    }

    /// Tags from the node and its config, deduplicated.
    pub fn all_tags(&self) -> BTreeSet<&str> {
        self.tags
            .iter()
            .chain(self.config.tags.iter())
            .map(String::as_str)
            .collect()
    }

    /// Whether the node carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.all_tags().contains(tag)
    }

    /// Whether the node has a version set.
    pub fn is_versioned(&self) -> bool {
        matches!(&self.version, Some(v) if !v.is_null())
    }
}

/// Node-level config block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialized: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(deserialize_with = "string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            materialized: None,
            schema: None,
            group: None,
            tags: Vec::new(),
        }
    }
}

/// dbt accepts `tags: foo` as well as `tags: [foo]` in config.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        None(Option<()>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::None(_) => Vec::new(),
    })
}

/// Upstream edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DependsOn {
    pub nodes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub macros: Vec<String>,
}

impl Manifest {
    /// Load and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `ManifestNotFound` if the file doesn't exist.
    /// Returns `ManifestParseError` if the JSON is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DbtdefsError::ManifestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DbtdefsError::Io(e)
            }
        })?;

        let manifest = Self::parse(&content, path)?;
        tracing::debug!(
            "Loaded manifest {} ({} nodes, {} sources)",
            path.display(),
            manifest.nodes.len(),
            manifest.sources.len()
        );
        Ok(manifest)
    }

    /// Parse manifest JSON.
    ///
    /// `source_path` is only used for error reporting.
    pub fn parse(content: &str, source_path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| DbtdefsError::ManifestParseError {
            path: PathBuf::from(source_path),
            message: e.to_string(),
        })
    }

    /// Find a node or source by unique id.
    pub fn node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes
            .get(unique_id)
            .or_else(|| self.sources.get(unique_id))
    }

    /// All nodes and sources, enabled or not.
    pub fn all_nodes(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values().chain(self.sources.values())
    }

    /// Downstream edges derived from `depends_on`.
    pub fn child_map(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for node in self.all_nodes() {
            for parent in &node.depends_on.nodes {
                children
                    .entry(parent.as_str())
                    .or_default()
                    .push(node.unique_id.as_str());
            }
        }
        children
    }

    /// Tests attached to a node, either via `attached_node` or as their
    /// only dependency.
    pub fn tests_for(&self, unique_id: &str) -> Vec<&ManifestNode> {
        self.nodes
            .values()
            .filter(|n| n.resource_type == ResourceType::Test)
            .filter(|n| match &n.attached_node {
                Some(attached) => attached == unique_id,
                None => n.depends_on.nodes.len() == 1 && n.depends_on.nodes[0] == unique_id,
            })
            .collect()
    }
}
