//! Execution context handed to an asset's execution body.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::spec::AssetKey;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier of one materialization run.
///
/// Format: `run_{timestamp_ms}_{hex}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    started_at: DateTime<Utc>,
    digest: String,
}

impl RunId {
    /// Generate a new run id.
    pub fn new() -> Self {
        let now = Utc::now();
        let started_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let seq = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(seq.to_le_bytes());
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(16);

        Self { started_at, digest }
    }

    /// When the run id was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_{}_{}",
            self.started_at.timestamp_millis(),
            self.digest
        )
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Handle passed by the host into an asset's execution body.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub run_id: RunId,
    /// Subset of asset keys to materialize; `None` means all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<BTreeSet<AssetKey>>,
}

impl ExecutionContext {
    /// Context that materializes every asset.
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            selected: None,
        }
    }

    /// Context that materializes only the given keys.
    pub fn with_selection<I: IntoIterator<Item = AssetKey>>(keys: I) -> Self {
        Self {
            run_id: RunId::new(),
            selected: Some(keys.into_iter().collect()),
        }
    }

    /// Whether this run covers a subset rather than everything.
    pub fn is_subset(&self) -> bool {
        self.selected.is_some()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_format() {
        let id = RunId::new().to_string();
        assert!(id.starts_with("run_"));
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 16);
        assert!(parts[1].parse::<i64>().is_ok());
    }

    #[test]
    fn run_ids_are_unique() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn default_context_is_not_subset() {
        assert!(!ExecutionContext::new().is_subset());
    }

    #[test]
    fn selection_context() {
        let ctx = ExecutionContext::with_selection([AssetKey::new(["orders"])]);
        assert!(ctx.is_subset());
        assert!(ctx
            .selected
            .as_ref()
            .unwrap()
            .contains(&AssetKey::new(["orders"])));
    }
}
