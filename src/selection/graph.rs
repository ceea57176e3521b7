//! Dependency graph walks for `+` operators.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::manifest::Manifest;

use super::parser::Depth;

/// Parent and child adjacency over a manifest.
#[derive(Debug)]
pub struct NodeGraph<'a> {
    parents: BTreeMap<&'a str, Vec<&'a str>>,
    children: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> NodeGraph<'a> {
    /// Build adjacency from `depends_on`.
    pub fn new(manifest: &'a Manifest) -> Self {
        let parents = manifest
            .all_nodes()
            .map(|n| {
                (
                    n.unique_id.as_str(),
                    n.depends_on.nodes.iter().map(String::as_str).collect(),
                )
            })
            .collect();

        Self {
            parents,
            children: manifest.child_map(),
        }
    }

    /// Nodes upstream of `start`, not including `start` itself.
    pub fn ancestors(&self, start: &BTreeSet<&'a str>, depth: Depth) -> BTreeSet<&'a str> {
        walk(&self.parents, start, depth)
    }

    /// Nodes downstream of `start`, not including `start` itself.
    pub fn descendants(&self, start: &BTreeSet<&'a str>, depth: Depth) -> BTreeSet<&'a str> {
        walk(&self.children, start, depth)
    }
}

fn walk<'a>(
    edges: &BTreeMap<&'a str, Vec<&'a str>>,
    start: &BTreeSet<&'a str>,
    depth: Depth,
) -> BTreeSet<&'a str> {
    let mut seen: BTreeSet<&'a str> = start.clone();
    let mut found = BTreeSet::new();
    let mut queue: VecDeque<(&'a str, usize)> = start.iter().map(|id| (*id, 0)).collect();

    while let Some((id, level)) = queue.pop_front() {
        if depth.is_some_and(|max| level >= max) {
            continue;
        }
        for &next in edges.get(id).into_iter().flatten() {
            if seen.insert(next) {
                found.insert(next);
                queue.push_back((next, level + 1));
            }
        }
    }

    found
}
