//! dbt-style node selection.
//!
//! Selection runs in two passes, the way dbt applies `--select` and
//! `--exclude`: everything matched by `select` minus everything matched
//! by `exclude`. Disabled nodes are never selected.
//!
//! # Example
//!
//! ```
//! use dbtdefs::manifest::Manifest;
//! use dbtdefs::selection::select_unique_ids;
//! use std::path::Path;
//!
//! let json = r#"{"nodes": {
//!   "model.p.a": {"unique_id": "model.p.a", "resource_type": "model", "name": "a",
//!                 "fqn": ["p", "a"], "tags": ["daily_partition"]},
//!   "model.p.b": {"unique_id": "model.p.b", "resource_type": "model", "name": "b",
//!                 "fqn": ["p", "b"]}
//! }}"#;
//! let manifest = Manifest::parse(json, Path::new("manifest.json")).unwrap();
//! let ids = select_unique_ids(&manifest, "fqn:*", "tag:daily_partition").unwrap();
//! assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["model.p.b".to_string()]);
//! ```

pub mod graph;
pub mod parser;
pub mod pattern;

use std::collections::BTreeSet;

pub use parser::{Criterion, Depth, Method, SelectionExpr, Term};
pub use pattern::GlobPattern;

use crate::error::Result;
use crate::manifest::{Manifest, ManifestNode};

use graph::NodeGraph;

impl Criterion {
    /// Whether a node matches this criterion, ignoring graph operators.
    pub fn matches(&self, node: &ManifestNode) -> bool {
        match self.method {
            Method::Fqn => fqn_matches(&self.value, node),
            Method::Tag => node.all_tags().iter().any(|t| self.pattern.matches(t)),
            Method::ResourceType => node.resource_type.as_str() == self.value,
            Method::Package => self.pattern.matches(&node.package_name),
            Method::Path => node
                .original_file_path
                .as_deref()
                .map(|p| p.starts_with(&self.value) || self.pattern.matches(p))
                .unwrap_or(false),
        }
    }
}

/// dbt fqn matching: a dotted pattern matches a prefix of the fqn segment
/// by segment, and a single segment also matches the bare node name.
fn fqn_matches(pattern: &str, node: &ManifestNode) -> bool {
    let segments: Vec<GlobPattern> = match pattern.split('.').map(GlobPattern::new).collect() {
        Ok(s) => s,
        Err(_) => return false,
    };

    if segments.len() == 1 && segments[0].matches(&node.name) {
        return true;
    }

    segments.len() <= node.fqn.len()
        && segments
            .iter()
            .zip(node.fqn.iter())
            .all(|(seg, part)| seg.matches(part))
}

impl SelectionExpr {
    /// Evaluate against a manifest, returning matched unique ids.
    pub fn evaluate(&self, manifest: &Manifest) -> BTreeSet<String> {
        let graph = NodeGraph::new(manifest);
        let mut selected = BTreeSet::new();

        for term in &self.terms {
            let mut term_ids: Option<BTreeSet<String>> = None;
            for criterion in &term.criteria {
                let ids = evaluate_criterion(criterion, manifest, &graph);
                term_ids = Some(match term_ids {
                    None => ids,
                    Some(prev) => prev.intersection(&ids).cloned().collect(),
                });
            }
            selected.extend(term_ids.unwrap_or_default());
        }

        selected
    }
}

fn evaluate_criterion(
    criterion: &Criterion,
    manifest: &Manifest,
    graph: &NodeGraph<'_>,
) -> BTreeSet<String> {
    let direct: BTreeSet<&str> = manifest
        .all_nodes()
        .filter(|n| n.config.enabled && criterion.matches(n))
        .map(|n| n.unique_id.as_str())
        .collect();

    let mut ids: BTreeSet<&str> = direct.clone();
    if let Some(depth) = criterion.parents {
        ids.extend(graph.ancestors(&direct, depth));
    }
    if let Some(depth) = criterion.children {
        ids.extend(graph.descendants(&direct, depth));
    }

    ids.into_iter()
        .filter(|id| manifest.node(id).is_some_and(|n| n.config.enabled))
        .map(str::to_string)
        .collect()
}

/// Apply `select` then remove `exclude`.
pub fn select_unique_ids(
    manifest: &Manifest,
    select: &str,
    exclude: &str,
) -> Result<BTreeSet<String>> {
    let select_expr = SelectionExpr::parse(select)?;
    let exclude_expr = SelectionExpr::parse(exclude)?;

    let selected = select_expr.evaluate(manifest);
    let excluded = exclude_expr.evaluate(manifest);

    tracing::debug!(
        "Selection '{}' matched {} nodes, exclusion '{}' matched {}",
        select,
        selected.len(),
        exclude,
        excluded.len()
    );

    Ok(selected.difference(&excluded).cloned().collect())
}
