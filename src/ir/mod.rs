//! Final IR: flattened, serialization-ready node records plus the directed
//! edge list and the analysis block.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyze::Analysis;
use crate::ast::WorkflowAst;
use crate::parse::JsonMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: Option<String>,
    pub resolved_config: JsonMap,
    /// Flattened runtime environment; empty when the node declared none.
    pub runtime_env: JsonMap,
    /// Flattened metadata; empty when the node was left unenriched.
    pub metadata: JsonMap,
    pub credentials: Option<JsonMap>,
    pub inputs: Vec<String>,
    pub position: Option<Value>,
    pub webhook_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrEdge {
    pub from_node: String,
    pub to_node: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrGraph {
    pub name: String,
    pub nodes: BTreeMap<String, IrNode>,
    pub edges: Vec<IrEdge>,
    pub analysis: Analysis,
}

fn flatten<T: Serialize>(value: Option<&T>) -> JsonMap {
    value
        .and_then(|v| serde_json::to_value(v).ok())
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

/// Project the final AST into the IR: one node record per AST node, one
/// edge per `(source, connection target)` pair. Nothing is synthesized or
/// dropped.
pub fn generate_ir(ast: &WorkflowAst, analysis: Analysis) -> IrGraph {
    let mut nodes = BTreeMap::new();
    let mut edges = Vec::new();

    for (node_id, node) in &ast.nodes {
        nodes.insert(
            node_id.clone(),
            IrNode {
                id: node_id.clone(),
                node_type: node.node_type.clone(),
                name: node.name.clone(),
                resolved_config: node.resolved_config.clone(),
                runtime_env: flatten(node.runtime_env.as_ref()),
                metadata: flatten(node.metadata.as_ref()),
                credentials: node.credentials.clone(),
                inputs: node.inputs.clone(),
                position: node.position.clone(),
                webhook_id: node.webhook_id.clone(),
            },
        );
        for target in &node.connections {
            edges.push(IrEdge {
                from_node: node_id.clone(),
                to_node: target.clone(),
            });
        }
    }

    IrGraph {
        name: ast.name.clone(),
        nodes,
        edges,
        analysis,
    }
}
