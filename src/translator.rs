//! Mapping from manifest nodes to assets.
//!
//! The translator decides what a dbt node is called in the asset graph.
//! Swap in a custom [`AssetTranslator`] to change keys or grouping without
//! touching selection or execution.

use serde::{Deserialize, Serialize};

use crate::assets::AssetKey;
use crate::manifest::{ManifestNode, ResourceType};

/// Translator switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorSettings {
    /// Turn dbt tests into asset checks.
    pub enable_asset_checks: bool,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            enable_asset_checks: true,
        }
    }
}

/// Translates manifest nodes into asset metadata.
pub trait AssetTranslator {
    /// Asset key for a model, seed, snapshot, or source.
    fn asset_key(&self, node: &ManifestNode) -> AssetKey;

    /// Group the asset belongs to.
    fn group_name(&self, node: &ManifestNode) -> Option<String> {
        node.config.group.clone()
    }

    /// Human-readable description.
    fn description(&self, node: &ManifestNode) -> Option<String> {
        let desc = node.description.trim();
        if desc.is_empty() {
            None
        } else {
            Some(desc.to_string())
        }
    }

    /// Name of the check produced from a test node.
    fn check_name(&self, test: &ManifestNode) -> String {
        test.name.clone()
    }

    /// Translator switches.
    fn settings(&self) -> TranslatorSettings;
}

/// The default translation rules.
///
/// - sources: `[source_name, name]`
/// - versioned nodes: `[alias]`
/// - nodes with a configured schema: `[schema, name]`
/// - everything else: `[name]`
#[derive(Debug, Clone, Default)]
pub struct DefaultTranslator {
    settings: TranslatorSettings,
}

impl DefaultTranslator {
    /// Create a translator with the given settings.
    pub fn new(settings: TranslatorSettings) -> Self {
        Self { settings }
    }
}

impl AssetTranslator for DefaultTranslator {
    fn asset_key(&self, node: &ManifestNode) -> AssetKey {
        if node.resource_type == ResourceType::Source {
            let source_name = node.source_name.as_deref().unwrap_or(&node.package_name);
            return AssetKey::new([source_name, node.name.as_str()]);
        }

        if node.is_versioned() {
            let alias = node.alias.as_deref().unwrap_or(&node.name);
            return AssetKey::new([alias]);
        }

        match &node.config.schema {
            Some(schema) => AssetKey::new([schema.as_str(), node.name.as_str()]),
            None => AssetKey::new([node.name.as_str()]),
        }
    }

    fn settings(&self) -> TranslatorSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::fixtures::JAFFLE;
    use crate::manifest::Manifest;
    use std::path::Path;

    fn jaffle() -> Manifest {
        Manifest::parse(JAFFLE, Path::new("manifest.json")).unwrap()
    }

    #[test]
    fn model_key_is_name() {
        let manifest = jaffle();
        let t = DefaultTranslator::default();
        assert_eq!(
            t.asset_key(&manifest.nodes["model.jaffle_shop.stg_orders"]),
            AssetKey::new(["stg_orders"])
        );
    }

    #[test]
    fn schema_prefixes_key() {
        let manifest = jaffle();
        let t = DefaultTranslator::default();
        assert_eq!(
            t.asset_key(&manifest.nodes["model.jaffle_shop.orders"]),
            AssetKey::new(["marts", "orders"])
        );
    }

    #[test]
    fn source_key_uses_source_name() {
        let manifest = jaffle();
        let t = DefaultTranslator::default();
        assert_eq!(
            t.asset_key(&manifest.sources["source.jaffle_shop.shop.customers"]),
            AssetKey::new(["shop", "customers"])
        );
    }

    #[test]
    fn versioned_model_uses_alias() {
        let json = r#"{"nodes": {"model.p.m": {"unique_id": "model.p.m", "resource_type": "model",
            "name": "m", "alias": "m_v2", "version": 2, "config": {"schema": "ignored"}}}}"#;
        let manifest = Manifest::parse(json, Path::new("m.json")).unwrap();
        let t = DefaultTranslator::default();
        assert_eq!(
            t.asset_key(&manifest.nodes["model.p.m"]),
            AssetKey::new(["m_v2"])
        );
    }

    #[test]
    fn group_and_description() {
        let manifest = jaffle();
        let t = DefaultTranslator::default();
        let orders = &manifest.nodes["model.jaffle_shop.orders"];
        assert_eq!(t.group_name(orders).as_deref(), Some("finance"));
        assert_eq!(t.description(orders), None);

        let stg = &manifest.nodes["model.jaffle_shop.stg_orders"];
        assert_eq!(t.description(stg).as_deref(), Some("Cleaned orders"));
    }

    #[test]
    fn checks_enabled_by_default() {
        assert!(DefaultTranslator::default().settings().enable_asset_checks);
    }
}
