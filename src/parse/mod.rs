//! Parse phase: platform export JSON → normalized `RawWorkflow`.

pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::{CompileError, Stage};

/// Deserialize a platform export document.
pub fn parse(json: &str) -> Result<ExportWorkflow, CompileError> {
    serde_json::from_str::<ExportWorkflow>(json)
        .map_err(|e| CompileError::new(Stage::Parse, format!("invalid workflow JSON: {e}")))
}

/// Original export nodes keyed by ID, retained verbatim for audit metadata.
pub type AuditNodes = BTreeMap<String, Value>;

/// Convert the export shape into an ID-keyed `RawWorkflow` with explicit
/// per-node successor lists.
///
/// Connection references to names absent from the node list are logged and
/// skipped, never fatal. Returns the normalized workflow plus the original
/// export nodes for later audit metadata.
pub fn preprocess(export: &ExportWorkflow) -> (RawWorkflow, AuditNodes) {
    let name_to_id: BTreeMap<&str, &str> = export
        .nodes
        .iter()
        .filter_map(|n| n.name.as_deref().map(|name| (name, n.id.as_str())))
        .collect();

    let mut next_map: BTreeMap<&str, Vec<String>> =
        export.nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for (source_name, outputs) in &export.connections {
        let Some(&source_id) = name_to_id.get(source_name.as_str()) else {
            warn!(source = %source_name, "connection source not found in node list");
            continue;
        };
        for group in outputs.values() {
            for targets in group {
                for target in targets {
                    let Some(&target_id) = name_to_id.get(target.node.as_str()) else {
                        warn!(target = %target.node, "connection target not found in node list");
                        continue;
                    };
                    let next = next_map.entry(source_id).or_default();
                    if !next.iter().any(|id| id == target_id) {
                        next.push(target_id.to_string());
                    }
                }
            }
        }
    }

    let mut nodes = BTreeMap::new();
    let mut audit = BTreeMap::new();
    for node in &export.nodes {
        audit.insert(
            node.id.clone(),
            serde_json::to_value(node).unwrap_or(Value::Null),
        );
        nodes.insert(
            node.id.clone(),
            RawNode {
                id: node.id.clone(),
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                type_version: coerce_type_version(node.type_version.as_ref()),
                config: node.parameters.clone(),
                next: next_map.remove(node.id.as_str()).unwrap_or_default(),
                disabled: node.disabled,
                credentials: node.credentials.clone(),
                position: node.position.clone(),
                webhook_id: node.webhook_id.clone(),
            },
        );
    }

    let workflow = RawWorkflow {
        name: export.name.clone().unwrap_or_else(|| "Unnamed Workflow".to_string()),
        nodes,
    };
    (workflow, audit)
}

/// Coerce `typeVersion` to its string form: `1` → `"1"`, `1.0` → `"1.0"`.
/// Absent or null versions default to `"1.0"`.
fn coerce_type_version(version: Option<&Value>) -> String {
    match version {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => "1.0".to_string(),
        Some(other) => other.to_string(),
    }
}
