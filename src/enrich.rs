//! Metadata enrichment: credentials, runtime environment, audit metadata,
//! and execution-hint classification.

use serde_json::Value;
use tracing::warn;

use crate::ast::{ExecutionHint, NodeMetadata, RuntimeEnv, WorkflowAst};
use crate::error::{CompileError, Stage};
use crate::parse::{AuditNodes, JsonMap};

/// Resolves one credential type's opaque data into its resolved form.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, credential: &Value) -> Result<Value, String>;
}

impl<F> CredentialResolver for F
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    fn resolve(&self, credential: &Value) -> Result<Value, String> {
        self(credential)
    }
}

/// Pluggable registry of credential type → resolver. Unknown types pass
/// through unresolved with a warning rather than failing.
#[derive(Default)]
pub struct CredentialRegistry {
    resolvers: std::collections::HashMap<String, Box<dyn CredentialResolver>>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        credential_type: impl Into<String>,
        resolver: impl CredentialResolver + 'static,
    ) {
        self.resolvers.insert(credential_type.into(), Box::new(resolver));
    }

    /// Resolve every entry of a node's credential map. A resolver error is
    /// fatal; a missing resolver is not.
    pub fn resolve_all(&self, credentials: &JsonMap) -> Result<JsonMap, String> {
        let mut resolved = JsonMap::new();
        for (cred_type, data) in credentials {
            match self.resolvers.get(cred_type) {
                Some(resolver) => {
                    let value = resolver
                        .resolve(data)
                        .map_err(|e| format!("credential resolution failed for '{cred_type}': {e}"))?;
                    resolved.insert(cred_type.clone(), value);
                }
                None => {
                    warn!(credential_type = %cred_type, "no resolver for credential type");
                    resolved.insert(cred_type.clone(), data.clone());
                }
            }
        }
        Ok(resolved)
    }
}

/// Classify a node type into an execution hint by case-insensitive
/// substring match. First match wins, checked in this fixed order.
pub fn classify_hint(node_type: &str) -> ExecutionHint {
    let lowered = node_type.to_ascii_lowercase();
    if ["http", "fetch", "api"].iter().any(|kw| lowered.contains(kw)) {
        ExecutionHint::IoBound
    } else if ["delay", "sleep", "wait"].iter().any(|kw| lowered.contains(kw)) {
        ExecutionHint::TimeBlocking
    } else if ["code", "function", "script"].iter().any(|kw| lowered.contains(kw)) {
        ExecutionHint::CpuBound
    } else {
        ExecutionHint::General
    }
}

/// Attach credentials, runtime environment, and metadata to every AST node
/// that has corresponding raw export data. A node with no raw data is
/// logged and left unenriched; any other enrichment failure aborts the
/// compile.
pub fn enrich_metadata(
    ast: &mut WorkflowAst,
    audit: &AuditNodes,
    registry: &CredentialRegistry,
) -> Result<(), CompileError> {
    for (node_id, node) in &mut ast.nodes {
        let Some(raw) = audit.get(node_id) else {
            warn!(node = %node_id, "no raw data for node");
            continue;
        };

        if let Some(credentials) = &node.credentials {
            let resolved = registry
                .resolve_all(credentials)
                .map_err(|e| CompileError::for_node(Stage::Enrich, e, node_id.as_str()))?;
            node.credentials = Some(resolved);
        }

        node.runtime_env = match raw.get("env") {
            Some(env @ Value::Object(map)) if !map.is_empty() => {
                let env: RuntimeEnv = serde_json::from_value(env.clone()).map_err(|e| {
                    CompileError::for_node(
                        Stage::Enrich,
                        format!("invalid env block: {e}"),
                        node_id.as_str(),
                    )
                })?;
                Some(env)
            }
            _ => None,
        };

        node.metadata = Some(NodeMetadata {
            notes: raw.get("notes").and_then(Value::as_str).map(String::from),
            tags: raw
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            created_by: raw.get("createdBy").and_then(Value::as_str).map(String::from),
            created_at: raw.get("createdAt").and_then(Value::as_str).map(String::from),
            last_modified: raw
                .get("lastModified")
                .and_then(Value::as_str)
                .map(String::from),
            llm_hint: classify_hint(&node.node_type),
            original_raw_node: raw.clone(),
        });
    }
    Ok(())
}
