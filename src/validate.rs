//! Canonical-shape validation of the migrated raw workflow.
//!
//! Rejects malformed input before any AST is built. Violations carry the
//! offending field path and reason.

use crate::error::{CompileError, Stage};
use crate::parse::RawWorkflow;

#[derive(Debug, Clone)]
pub struct Violation {
    /// Field path, e.g. `nodes.abc123.id`.
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Validate the canonical raw-workflow shape. Returns all violations found.
pub fn check_structure(workflow: &RawWorkflow) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (key, node) in &workflow.nodes {
        if node.id.is_empty() {
            violations.push(Violation {
                path: format!("nodes.{key}.id"),
                reason: "node id must be non-empty".to_string(),
            });
        } else if *key != node.id {
            violations.push(Violation {
                path: format!("nodes.{key}"),
                reason: format!("map key does not match node id '{}'", node.id),
            });
        }
        if node.node_type.is_empty() {
            violations.push(Violation {
                path: format!("nodes.{key}.type"),
                reason: "node type must be non-empty".to_string(),
            });
        }
        if node.type_version.is_empty() {
            violations.push(Violation {
                path: format!("nodes.{key}.type_version"),
                reason: "type_version must be non-empty".to_string(),
            });
        }
    }

    violations
}

/// Validate and fail the compile on the first violations found.
pub fn validate_structure(workflow: &RawWorkflow) -> Result<(), CompileError> {
    let violations = check_structure(workflow);
    if violations.is_empty() {
        return Ok(());
    }
    let summary = violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(CompileError::new(
        Stage::Validate,
        format!("workflow validation failed: {summary}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::RawNode;
    use std::collections::BTreeMap;

    fn workflow_with(key: &str, node: RawNode) -> RawWorkflow {
        let mut nodes = BTreeMap::new();
        nodes.insert(key.to_string(), node);
        RawWorkflow { name: "wf".to_string(), nodes }
    }

    fn node(id: &str, node_type: &str) -> RawNode {
        RawNode {
            id: id.to_string(),
            name: None,
            node_type: node_type.to_string(),
            type_version: "1.0".to_string(),
            config: Default::default(),
            next: vec![],
            disabled: false,
            credentials: None,
            position: None,
            webhook_id: None,
        }
    }

    #[test]
    fn valid_workflow_passes() {
        let workflow = workflow_with("a", node("a", "noOp"));
        assert!(validate_structure(&workflow).is_ok());
    }

    #[test]
    fn key_id_mismatch_is_reported_with_path() {
        let workflow = workflow_with("a", node("b", "noOp"));
        let violations = check_structure(&workflow);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "nodes.a");
    }

    #[test]
    fn empty_type_fails_compile() {
        let workflow = workflow_with("a", node("a", ""));
        let err = validate_structure(&workflow).unwrap_err();
        assert_eq!(err.stage, Stage::Validate);
        assert!(err.message.contains("nodes.a.type"));
    }
}
