//! AST node model and normalizer.
//!
//! Nodes live in a flat arena (`WorkflowAst.nodes`); `connections` and
//! `inputs` are ID references resolved through the arena, so the graph may
//! legitimately contain cycles without ownership issues.

pub mod connections;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::{JsonMap, RawWorkflow};

/// Coarse execution-hint classification attached during enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionHint {
    IoBound,
    TimeBlocking,
    CpuBound,
    General,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeEnv {
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub memory_limit: Option<String>,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
    pub llm_hint: ExecutionHint,
    /// Verbatim copy of the pre-enrichment export node, for audit/debug.
    pub original_raw_node: Value,
}

/// One workflow node after normalization. Enriched in place by the later
/// stages; never replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: String,
    pub config: JsonMap,
    /// Raw successor IDs from preprocessing (may dangle).
    pub next: Vec<String>,
    /// Resolved successor IDs, populated once by the connection builder.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Source node IDs, the reverse of `connections`.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Populated by the interpreter; empty until then.
    #[serde(default)]
    pub resolved_config: JsonMap,
    pub runtime_env: Option<RuntimeEnv>,
    pub metadata: Option<NodeMetadata>,
    pub credentials: Option<JsonMap>,
    pub disabled: bool,
    pub position: Option<Value>,
    pub webhook_id: Option<String>,
}

/// Owns all nodes; graph edges are ID references into `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAst {
    pub name: String,
    pub nodes: BTreeMap<String, AstNode>,
}

/// Convert a validated raw workflow into AST node records, one per node.
pub fn normalize(raw: &RawWorkflow) -> WorkflowAst {
    let nodes = raw
        .nodes
        .iter()
        .map(|(id, raw_node)| {
            (
                id.clone(),
                AstNode {
                    id: raw_node.id.clone(),
                    name: raw_node.name.clone(),
                    node_type: raw_node.node_type.clone(),
                    type_version: raw_node.type_version.clone(),
                    config: raw_node.config.clone(),
                    next: raw_node.next.clone(),
                    connections: Vec::new(),
                    inputs: Vec::new(),
                    resolved_config: JsonMap::new(),
                    runtime_env: None,
                    metadata: None,
                    credentials: raw_node.credentials.clone(),
                    disabled: raw_node.disabled,
                    position: raw_node.position.clone(),
                    webhook_id: raw_node.webhook_id.clone(),
                },
            )
        })
        .collect();

    WorkflowAst {
        name: raw.name.clone(),
        nodes,
    }
}
