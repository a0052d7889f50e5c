//! Connection builder: resolves each node's `next` list into graph edges.
//!
//! The only stage that establishes topology; runs exactly once per compile.

use tracing::warn;

use super::WorkflowAst;

/// For every non-disabled node, resolve `next` IDs into `connections` and
/// populate the reverse `inputs` references. Dangling IDs are logged and
/// skipped; both lists are deduplicated.
pub fn build_connections(ast: &mut WorkflowAst) {
    let ids: Vec<String> = ast.nodes.keys().cloned().collect();

    for id in &ids {
        let Some(node) = ast.nodes.get(id) else { continue };
        if node.disabled {
            continue;
        }
        let next = node.next.clone();

        for next_id in next {
            if !ast.nodes.contains_key(&next_id) {
                warn!(node = %id, target = %next_id, "node points to missing node");
                continue;
            }
            if let Some(source) = ast.nodes.get_mut(id)
                && !source.connections.contains(&next_id)
            {
                source.connections.push(next_id.clone());
            }
            if let Some(target) = ast.nodes.get_mut(&next_id)
                && !target.inputs.contains(id)
            {
                target.inputs.push(id.clone());
            }
        }
    }
}
