#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use flowc::ast::{self, WorkflowAst, connections};
use flowc::interpret::{InterpretError, InterpretationService, ResolutionMode, SafeNode};
use flowc::parse::{JsonMap, RawNode, RawWorkflow};

// =============================================================================
// Workflow builders
// =============================================================================

pub fn raw_node(id: &str, node_type: &str, next: Vec<&str>) -> RawNode {
    RawNode {
        id: id.to_string(),
        name: Some(id.to_string()),
        node_type: node_type.to_string(),
        type_version: "1.0".to_string(),
        config: JsonMap::new(),
        next: next.into_iter().map(String::from).collect(),
        disabled: false,
        credentials: None,
        position: None,
        webhook_id: None,
    }
}

pub fn raw_workflow(nodes: Vec<RawNode>) -> RawWorkflow {
    let nodes: BTreeMap<String, RawNode> =
        nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
    RawWorkflow {
        name: "test".to_string(),
        nodes,
    }
}

/// AST with connections already built from `(id, successors)` pairs.
pub fn linked_ast(nodes: Vec<(&str, Vec<&str>)>) -> WorkflowAst {
    let raw = raw_workflow(
        nodes
            .into_iter()
            .map(|(id, next)| raw_node(id, "noOp", next))
            .collect(),
    );
    let mut ast = ast::normalize(&raw);
    connections::build_connections(&mut ast);
    ast
}

// =============================================================================
// Counting mock interpretation service
// =============================================================================

pub enum Behavior {
    /// Every primary call succeeds.
    Succeed,
    /// The first `n` primary calls fail with a transport error, then succeed.
    FailTransientTimes(usize),
    /// Every primary call fails with a bad-request signature; the fallback
    /// succeeds or fails as configured.
    AlwaysBadRequest { fallback_succeeds: bool },
    /// Every call hangs until cancelled by the caller's timeout.
    Hang,
}

pub struct CountingService {
    pub behavior: Behavior,
    pub primary_calls: AtomicUsize,
    pub fallback_calls: AtomicUsize,
}

impl CountingService {
    pub fn new(behavior: Behavior) -> Self {
        CountingService {
            behavior,
            primary_calls: AtomicUsize::new(0),
            fallback_calls: AtomicUsize::new(0),
        }
    }

    pub fn primary(&self) -> usize {
        self.primary_calls.load(Ordering::SeqCst)
    }

    pub fn fallback(&self) -> usize {
        self.fallback_calls.load(Ordering::SeqCst)
    }

    fn success_payload(node: &SafeNode) -> Value {
        json!({"resolved_config": {"resolved": true, "for": node.id}})
    }
}

#[async_trait]
impl InterpretationService for CountingService {
    async fn interpret(
        &self,
        node: &SafeNode,
        mode: ResolutionMode,
    ) -> Result<Value, InterpretError> {
        match mode {
            ResolutionMode::Primary => {
                let call = self.primary_calls.fetch_add(1, Ordering::SeqCst) + 1;
                match &self.behavior {
                    Behavior::Succeed => Ok(Self::success_payload(node)),
                    Behavior::FailTransientTimes(n) => {
                        if call <= *n {
                            Err(InterpretError::Transport("connection reset".to_string()))
                        } else {
                            Ok(Self::success_payload(node))
                        }
                    }
                    Behavior::AlwaysBadRequest { .. } => {
                        Err(InterpretError::BadRequest("400 Bad Request".to_string()))
                    }
                    Behavior::Hang => {
                        std::future::pending::<()>().await;
                        unreachable!()
                    }
                }
            }
            ResolutionMode::Conservative => {
                self.fallback_calls.fetch_add(1, Ordering::SeqCst);
                match &self.behavior {
                    Behavior::AlwaysBadRequest { fallback_succeeds: true } => {
                        Ok(Self::success_payload(node))
                    }
                    Behavior::AlwaysBadRequest { fallback_succeeds: false } => {
                        Err(InterpretError::BadRequest("400 Bad Request".to_string()))
                    }
                    Behavior::Hang => {
                        std::future::pending::<()>().await;
                        unreachable!()
                    }
                    _ => Ok(Self::success_payload(node)),
                }
            }
        }
    }
}
