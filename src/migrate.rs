//! Per-node schema migration keyed by declared `type_version`.

use std::collections::HashMap;

use tracing::info;

use crate::error::{CompileError, Stage};
use crate::parse::{RawNode, RawWorkflow};

/// A pure transform from one schema version to the next. Returning `Err`
/// aborts the whole workflow migration.
pub type MigrationFn = fn(RawNode) -> Result<RawNode, String>;

/// Registry of *source* version → transform. A node migrated once will not
/// match its source version again, so re-running is safe.
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: HashMap<String, MigrationFn>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry carrying the built-in migrations.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("0.9", migrate_from_0_9);
        registry
    }

    pub fn register(&mut self, version: impl Into<String>, migration: MigrationFn) {
        self.migrations.insert(version.into(), migration);
    }

    /// Apply the registered migration for the node's declared version, if
    /// any. Unregistered versions pass through unchanged.
    pub fn migrate_node(&self, node: RawNode) -> Result<RawNode, CompileError> {
        match self.migrations.get(&node.type_version) {
            Some(migration) => {
                let id = node.id.clone();
                let from = node.type_version.clone();
                let migrated = migration(node)
                    .map_err(|e| CompileError::for_node(Stage::Migrate, e, &id))?;
                info!(node = %id, from = %from, to = %migrated.type_version, "migrated node schema");
                Ok(migrated)
            }
            None => Ok(node),
        }
    }

    /// Migrate every node in the workflow. Fails atomically: the first
    /// migration error aborts with no partial schema state surfaced.
    pub fn migrate_workflow(&self, mut workflow: RawWorkflow) -> Result<RawWorkflow, CompileError> {
        let ids: Vec<String> = workflow.nodes.keys().cloned().collect();
        for id in ids {
            if let Some(node) = workflow.nodes.remove(&id) {
                let migrated = self.migrate_node(node)?;
                workflow.nodes.insert(id, migrated);
            }
        }
        Ok(workflow)
    }
}

/// v0.9 → v1.0: the legacy `request` node type became `httpRequest`.
fn migrate_from_0_9(mut node: RawNode) -> Result<RawNode, String> {
    if node.node_type == "request" {
        node.node_type = "httpRequest".to_string();
    }
    node.type_version = "1.0".to_string();
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn raw_node(id: &str, node_type: &str, version: &str) -> RawNode {
        RawNode {
            id: id.to_string(),
            name: None,
            node_type: node_type.to_string(),
            type_version: version.to_string(),
            config: Default::default(),
            next: vec![],
            disabled: false,
            credentials: None,
            position: None,
            webhook_id: None,
        }
    }

    #[test]
    fn default_registry_rewrites_legacy_request_nodes() {
        let registry = MigrationRegistry::with_defaults();
        let node = registry.migrate_node(raw_node("a", "request", "0.9")).unwrap();
        assert_eq!(node.node_type, "httpRequest");
        assert_eq!(node.type_version, "1.0");
    }

    #[test]
    fn unregistered_versions_pass_through() {
        let registry = MigrationRegistry::with_defaults();
        let node = registry.migrate_node(raw_node("a", "noOp", "3")).unwrap();
        assert_eq!(node.node_type, "noOp");
        assert_eq!(node.type_version, "3");
    }

    #[test]
    fn migration_is_safe_to_rerun() {
        let registry = MigrationRegistry::with_defaults();
        let once = registry.migrate_node(raw_node("a", "request", "0.9")).unwrap();
        let twice = registry.migrate_node(once.clone()).unwrap();
        assert_eq!(once.node_type, twice.node_type);
        assert_eq!(once.type_version, twice.type_version);
    }

    #[test]
    fn migration_error_aborts_workflow() {
        fn failing(_: RawNode) -> Result<RawNode, String> {
            Err("boom".to_string())
        }
        let mut registry = MigrationRegistry::new();
        registry.register("2", failing);

        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), raw_node("a", "noOp", "2"));
        let workflow = RawWorkflow { name: "wf".to_string(), nodes };

        let err = registry.migrate_workflow(workflow).unwrap_err();
        assert_eq!(err.stage, Stage::Migrate);
        assert_eq!(err.node_id.as_deref(), Some("a"));
    }
}
