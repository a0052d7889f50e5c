//! Serde types for the platform export shape and the normalized raw workflow.
//!
//! `ExportWorkflow` mirrors the JSON emitted by the visual automation
//! platform (node list + name-keyed connection map). `RawWorkflow` is the
//! normalized, ID-keyed form the rest of the pipeline consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque key→value configuration map.
pub type JsonMap = serde_json::Map<String, Value>;

// =============================================================================
// PLATFORM EXPORT SHAPE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportWorkflow {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<ExportNode>,
    /// `source name → output slot → [[{node: target name, ...}]]`.
    #[serde(default)]
    pub connections: BTreeMap<String, BTreeMap<String, Vec<Vec<ConnectionTarget>>>>,
}

/// One node as exported by the platform. Unknown fields (notes, tags,
/// audit stamps, env) are preserved in `extra` for the enrichment stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    /// May arrive as a string, integer, or float; normalized downstream.
    pub type_version: Option<Value>,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default)]
    pub disabled: bool,
    pub credentials: Option<JsonMap>,
    pub position: Option<Value>,
    pub webhook_id: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Target node *name* (not ID).
    pub node: String,
    #[serde(flatten)]
    pub extra: JsonMap,
}

// =============================================================================
// NORMALIZED RAW WORKFLOW
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Always a string after preprocessing (`1` → `"1"`, `1.0` → `"1.0"`).
    pub type_version: String,
    #[serde(default)]
    pub config: JsonMap,
    /// Ordered successor node IDs. May contain dangling IDs.
    #[serde(default)]
    pub next: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    pub credentials: Option<JsonMap>,
    pub position: Option<Value>,
    pub webhook_id: Option<String>,
}

/// Invariant: every key of `nodes` equals the `id` of its value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWorkflow {
    pub name: String,
    pub nodes: BTreeMap<String, RawNode>,
}
