//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small compiled manifest: one seed, two models (one tagged
/// `daily_partition`), and a test on the untagged model.
pub const MANIFEST: &str = r#"{
  "metadata": {"dbt_version": "1.8.0", "project_name": "shop"},
  "nodes": {
    "seed.shop.raw_customers": {
      "unique_id": "seed.shop.raw_customers",
      "resource_type": "seed",
      "name": "raw_customers",
      "package_name": "shop",
      "fqn": ["shop", "raw_customers"]
    },
    "model.shop.customers": {
      "unique_id": "model.shop.customers",
      "resource_type": "model",
      "name": "customers",
      "package_name": "shop",
      "fqn": ["shop", "marts", "customers"],
      "depends_on": {"nodes": ["seed.shop.raw_customers"]}
    },
    "model.shop.customers_daily": {
      "unique_id": "model.shop.customers_daily",
      "resource_type": "model",
      "name": "customers_daily",
      "package_name": "shop",
      "fqn": ["shop", "marts", "customers_daily"],
      "tags": ["daily_partition"],
      "depends_on": {"nodes": ["model.shop.customers"]}
    },
    "test.shop.unique_customers_id.1a2b": {
      "unique_id": "test.shop.unique_customers_id.1a2b",
      "resource_type": "test",
      "name": "unique_customers_id",
      "package_name": "shop",
      "fqn": ["shop", "unique_customers_id"],
      "attached_node": "model.shop.customers",
      "depends_on": {"nodes": ["model.shop.customers"]}
    }
  },
  "sources": {}
}"#;

/// A project directory holding `target/manifest.json` and a
/// `dbtdefs.yml` pointing everything at it.
pub struct Project {
    pub temp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self::with_settings("")
    }

    /// `extra` is appended to the generated settings.
    pub fn with_settings(extra: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("manifest.json"), MANIFEST).unwrap();

        let settings = format!(
            "manifest_path: {manifest}\nproject_dir: {dir}\nprofiles_dir: {dir}\n{extra}",
            manifest = target.join("manifest.json").display(),
            dir = temp.path().display(),
        );
        fs::write(temp.path().join("dbtdefs.yml"), settings).unwrap();

        Self { temp }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.temp.path().join("target").join("manifest.json")
    }
}

/// JSON log line for a finished node.
pub fn node_finished(unique_id: &str, status: &str) -> String {
    format!(
        r#"{{"info": {{"name": "NodeFinished", "level": "info", "msg": "{id} {status}"}}, "data": {{"node_info": {{"unique_id": "{id}", "node_status": "{status}"}}}}}}"#,
        id = unique_id,
        status = status
    )
}
