//! Static analysis over the connection graph: dead-node detection and
//! cycle enumeration. Analysis never fails; it only reports findings.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ast::WorkflowAst;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub dead_nodes: Vec<String>,
    pub cycles: Vec<Vec<String>>,
}

fn build_graph(ast: &WorkflowAst) -> (DiGraph<&str, ()>, BTreeMap<&str, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut indices = BTreeMap::new();
    for id in ast.nodes.keys() {
        let idx = graph.add_node(id.as_str());
        indices.insert(id.as_str(), idx);
    }
    for (id, node) in &ast.nodes {
        for target in &node.connections {
            if let (Some(&s), Some(&t)) = (indices.get(id.as_str()), indices.get(target.as_str())) {
                graph.add_edge(s, t, ());
            }
        }
    }
    (graph, indices)
}

/// Find nodes unreachable by forward traversal from any root (a node with
/// no inputs). Isolated nodes are their own roots and are never dead.
pub fn detect_dead_nodes(ast: &WorkflowAst) -> Vec<String> {
    let (graph, indices) = build_graph(ast);

    let mut reachable: HashSet<NodeIndex> = HashSet::new();
    for (id, node) in &ast.nodes {
        if !node.inputs.is_empty() {
            continue;
        }
        let Some(&root) = indices.get(id.as_str()) else { continue };
        let mut dfs = Dfs::new(&graph, root);
        while let Some(nx) = dfs.next(&graph) {
            reachable.insert(nx);
        }
    }

    ast.nodes
        .keys()
        .filter(|id| {
            indices
                .get(id.as_str())
                .is_none_or(|idx| !reachable.contains(idx))
        })
        .cloned()
        .collect()
}

/// Enumerate cycles with an explicit-stack DFS carrying the active path.
///
/// A neighbor already on the active path closes a cycle: the cyclic suffix
/// of the path is reported, ending with the repeated node. A node fully
/// popped off the active path is marked visited and never re-pushed.
pub fn detect_cycles(ast: &WorkflowAst) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for start in ast.nodes.keys() {
        if visited.contains(start.as_str()) {
            continue;
        }

        // (node, index of the next neighbor to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        let mut path: Vec<&str> = vec![start.as_str()];
        let mut on_path: HashSet<&str> = HashSet::from([start.as_str()]);

        while let Some(&(current, idx)) = stack.last() {
            let neighbors = ast
                .nodes
                .get(current)
                .map(|n| n.connections.as_slice())
                .unwrap_or(&[]);

            if idx >= neighbors.len() {
                stack.pop();
                path.pop();
                on_path.remove(current);
                visited.insert(current);
                continue;
            }
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let neighbor = neighbors[idx].as_str();
            if on_path.contains(neighbor) {
                let pos = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.to_string());
                cycles.push(cycle);
            } else if !visited.contains(neighbor) && ast.nodes.contains_key(neighbor) {
                stack.push((neighbor, 0));
                path.push(neighbor);
                on_path.insert(neighbor);
            }
        }
    }

    cycles
}

/// Run both analyses and log findings.
pub fn analyze_workflow(ast: &WorkflowAst) -> Analysis {
    let dead_nodes = detect_dead_nodes(ast);
    let cycles = detect_cycles(ast);

    if !dead_nodes.is_empty() {
        warn!(?dead_nodes, "dead nodes detected");
    }
    if !cycles.is_empty() {
        warn!(?cycles, "cycles detected");
    }

    Analysis { dead_nodes, cycles }
}
