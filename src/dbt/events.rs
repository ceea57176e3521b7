//! dbt structured log events.
//!
//! With `--log-format json` every line dbt prints is one JSON object with
//! an `info` header and a `data` payload. `NodeFinished` carries the
//! outcome of one node, which is what turns into materializations and
//! check results. Every other line is relayed as a log event.

use serde::{Deserialize, Serialize};

use super::process::OutputLine;
use crate::assets::{AssetDefinition, AssetKey};

/// Name of the event dbt emits when a node completes.
pub const NODE_FINISHED: &str = "NodeFinished";

/// A parsed dbt JSON log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtLogRecord {
    pub info: LogInfo,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The `info` header of a dbt log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInfo {
    pub name: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The `data.node_info` payload of node-level events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub unique_id: String,
    #[serde(default)]
    pub node_status: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub node_name: String,
}

impl DbtLogRecord {
    /// Parse one output line. Returns `None` for non-JSON output.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    /// Node info, if the event carries one.
    pub fn node_info(&self) -> Option<NodeInfo> {
        self.data
            .get("node_info")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// What an event means for the asset graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A selected model, seed, or snapshot finished successfully.
    Materialization {
        asset_key: AssetKey,
        unique_id: String,
    },
    /// A test attached to a selected asset finished.
    CheckEvaluation {
        check_name: String,
        asset_key: AssetKey,
        unique_id: String,
        passed: bool,
        status: String,
    },
    /// A node finished without success.
    NodeFailed { unique_id: String, status: String },
    /// Any other structured line.
    Log { level: String, name: String, message: String },
    /// A line that is not dbt JSON.
    Raw,
}

/// One relayed line of dbt output with its typed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionEvent {
    /// The line exactly as dbt wrote it.
    #[serde(skip)]
    pub line: OutputLine,
    /// Parsed JSON, when the line was JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DbtLogRecord>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ExecutionEvent {
    /// The raw line text.
    pub fn raw(&self) -> &str {
        self.line.text()
    }

    /// Human-readable message for display.
    pub fn message(&self) -> &str {
        match &self.record {
            Some(record) if !record.info.msg.is_empty() => &record.info.msg,
            _ => self.raw(),
        }
    }

    /// Whether this event reports a failure.
    pub fn is_failure(&self) -> bool {
        match &self.kind {
            EventKind::NodeFailed { .. } => true,
            EventKind::CheckEvaluation { passed, .. } => !passed,
            _ => false,
        }
    }
}

/// Turns dbt output lines into [`ExecutionEvent`]s for one definition.
#[derive(Debug)]
pub struct EventClassifier<'a> {
    definition: &'a AssetDefinition,
}

impl<'a> EventClassifier<'a> {
    /// Classify against the assets and checks of `definition`.
    pub fn new(definition: &'a AssetDefinition) -> Self {
        Self { definition }
    }

    /// Classify one line. Never drops a line.
    pub fn classify(&self, line: OutputLine) -> ExecutionEvent {
        let record = DbtLogRecord::parse(line.text());
        let kind = match &record {
            None => EventKind::Raw,
            Some(record) => self.kind_for(record),
        };
        ExecutionEvent { line, record, kind }
    }

    fn kind_for(&self, record: &DbtLogRecord) -> EventKind {
        let log = || EventKind::Log {
            level: record.info.level.clone(),
            name: record.info.name.clone(),
            message: record.info.msg.clone(),
        };

        if record.info.name != NODE_FINISHED {
            return log();
        }
        let Some(node) = record.node_info() else {
            return log();
        };

        if let Some(check) = self.definition.check_by_unique_id(&node.unique_id) {
            let passed = node.node_status == "pass";
            return EventKind::CheckEvaluation {
                check_name: check.name.clone(),
                asset_key: check.asset_key.clone(),
                unique_id: node.unique_id,
                passed,
                status: node.node_status,
            };
        }

        match self.definition.spec_by_unique_id(&node.unique_id) {
            Some(spec) if node.node_status == "success" => EventKind::Materialization {
                asset_key: spec.key.clone(),
                unique_id: node.unique_id,
            },
            Some(_) => EventKind::NodeFailed {
                unique_id: node.unique_id,
                status: node.node_status,
            },
            None => log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetDefinition;
    use crate::manifest::fixtures::JAFFLE;
    use crate::manifest::Manifest;
    use crate::translator::DefaultTranslator;
    use std::path::Path;

    fn definition() -> AssetDefinition {
        let manifest = Manifest::parse(JAFFLE, Path::new("manifest.json")).unwrap();
        AssetDefinition::from_manifest(
            "non_partitioned_dbt_assets",
            Path::new("manifest.json"),
            &manifest,
            "fqn:*",
            "tag:daily_partition",
            &DefaultTranslator::default(),
        )
        .unwrap()
    }

    fn node_finished(unique_id: &str, status: &str) -> String {
        serde_json::json!({
            "info": {"name": "NodeFinished", "level": "debug", "msg": "Finished running node"},
            "data": {"node_info": {"unique_id": unique_id, "node_status": status}}
        })
        .to_string()
    }

    #[test]
    fn non_json_line_is_raw() {
        let def = definition();
        let event = EventClassifier::new(&def).classify(OutputLine::Stderr("boom".into()));
        assert_eq!(event.kind, EventKind::Raw);
        assert_eq!(event.raw(), "boom");
        assert_eq!(event.message(), "boom");
    }

    #[test]
    fn successful_model_is_materialization() {
        let def = definition();
        let line = node_finished("model.jaffle_shop.orders", "success");
        let event = EventClassifier::new(&def).classify(OutputLine::Stdout(line.clone()));
        assert_eq!(
            event.kind,
            EventKind::Materialization {
                asset_key: AssetKey::new(["marts", "orders"]),
                unique_id: "model.jaffle_shop.orders".into(),
            }
        );
        assert_eq!(event.raw(), line);
    }

    #[test]
    fn failed_model_is_node_failed() {
        let def = definition();
        let line = node_finished("model.jaffle_shop.orders", "error");
        let event = EventClassifier::new(&def).classify(OutputLine::Stdout(line));
        assert!(event.is_failure());
        assert!(matches!(event.kind, EventKind::NodeFailed { ref status, .. } if status == "error"));
    }

    #[test]
    fn test_result_is_check_evaluation() {
        let def = definition();
        let line = node_finished(
            "test.jaffle_shop.not_null_orders_order_id.abc123",
            "fail",
        );
        let event = EventClassifier::new(&def).classify(OutputLine::Stdout(line));
        match event.kind {
            EventKind::CheckEvaluation {
                ref check_name,
                passed,
                ..
            } => {
                assert_eq!(check_name, "not_null_orders_order_id");
                assert!(!passed);
            }
            ref other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn unselected_node_is_plain_log() {
        let def = definition();
        let line = node_finished("model.jaffle_shop.orders_daily", "success");
        let event = EventClassifier::new(&def).classify(OutputLine::Stdout(line));
        assert!(matches!(event.kind, EventKind::Log { .. }));
    }

    #[test]
    fn other_events_are_logs_with_message() {
        let def = definition();
        let line = r#"{"info": {"name": "MainReportVersion", "level": "info", "msg": "Running with dbt=1.7.4"}, "data": {}}"#;
        let event = EventClassifier::new(&def).classify(OutputLine::Stdout(line.into()));
        assert_eq!(event.message(), "Running with dbt=1.7.4");
        assert!(!event.is_failure());
    }

    #[test]
    fn record_parse_rejects_plain_text() {
        assert!(DbtLogRecord::parse("12:00:00  Running with dbt=1.7.4").is_none());
        assert!(DbtLogRecord::parse("{broken").is_none());
    }
}
