//! Node-configuration resolution through the external semantic-
//! interpretation service, with content-addressed caching, bounded retry,
//! and a conservative fallback mode.

pub mod cache;
pub mod service;

pub use cache::{ConfigCache, content_key};
pub use service::{HttpInterpreter, HttpInterpreterConfig, ModelProfile};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::{AstNode, ExecutionHint, WorkflowAst};
use crate::parse::JsonMap;

// =============================================================================
// SERVICE COLLABORATOR
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    Primary,
    /// Lower creativity, stricter output contract. Used at most once per
    /// resolution, after a bad-request-class failure.
    Conservative,
}

/// Failure taxonomy for one interpretation call.
#[derive(Debug, Clone, Error)]
pub enum InterpretError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("call timed out")]
    Timeout,
    #[error("request rejected: {0}")]
    BadRequest(String),
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response missing 'resolved_config' key")]
    MissingResolvedConfig,
}

impl InterpretError {
    /// Transient failures worth another primary attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InterpretError::Transport(_)
                | InterpretError::Timeout
                | InterpretError::MissingResolvedConfig
        )
    }

    /// Malformed/rejected-request signatures that warrant one conservative
    /// fallback call instead of further retries.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            InterpretError::BadRequest(_) | InterpretError::InvalidJson(_)
        )
    }
}

/// Exhausted retries and fallback for a single node.
#[derive(Debug, Clone, Error)]
#[error("interpretation failed for node '{node_id}': {cause}")]
pub struct ResolveError {
    pub node_id: String,
    #[source]
    pub cause: InterpretError,
}

/// The external semantic-interpretation service, consumed as a black box.
///
/// Implementations return the structured payload of one call; the payload
/// is expected to carry a `resolved_config` object, which the resolver
/// validates. Body text that does not parse as JSON must surface as
/// [`InterpretError::InvalidJson`].
#[async_trait]
pub trait InterpretationService: Send + Sync {
    async fn interpret(
        &self,
        node: &SafeNode,
        mode: ResolutionMode,
    ) -> Result<Value, InterpretError>;
}

// =============================================================================
// SAFE PROJECTION
// =============================================================================

/// Only the credential name and type survive projection; secrets never
/// reach the service.
#[derive(Debug, Clone, Serialize)]
pub struct SafeCredential {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub credential_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafeNodeMetadata {
    pub llm_hint: Option<ExecutionHint>,
}

/// A node's external-facing description sent to the interpretation
/// service. The content hash of this projection is the cache key, so every
/// field here participates in cache identity (including `id`).
#[derive(Debug, Clone, Serialize)]
pub struct SafeNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: String,
    pub config: JsonMap,
    pub credentials: BTreeMap<String, SafeCredential>,
    pub metadata: SafeNodeMetadata,
}

/// Reduce an AST node to its LLM-safe projection.
pub fn build_safe_node(node: &AstNode) -> SafeNode {
    let credentials = node
        .credentials
        .iter()
        .flatten()
        .map(|(cred_type, info)| {
            (
                cred_type.clone(),
                SafeCredential {
                    name: info.get("name").and_then(Value::as_str).map(String::from),
                    credential_type: cred_type.clone(),
                },
            )
        })
        .collect();

    SafeNode {
        id: node.id.clone(),
        name: node.name.clone(),
        node_type: node.node_type.clone(),
        type_version: node.type_version.clone(),
        config: node.config.clone(),
        credentials,
        metadata: SafeNodeMetadata {
            llm_hint: node.metadata.as_ref().map(|m| m.llm_hint),
        },
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Explicit retry policy: attempt budget plus an exponential backoff
/// schedule (doubling from `base_delay`, capped at `max_delay`).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based): 1s, 2s, 4s...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Per-node resolution driver: cache lookup, bounded retry with backoff,
/// one-shot conservative fallback.
pub struct NodeResolver {
    service: Arc<dyn InterpretationService>,
    cache: Arc<ConfigCache>,
    retry: RetryPolicy,
    call_timeout: Duration,
    fallback_timeout: Duration,
}

impl NodeResolver {
    pub fn new(
        service: Arc<dyn InterpretationService>,
        cache: Arc<ConfigCache>,
        retry: RetryPolicy,
        call_timeout: Duration,
        fallback_timeout: Duration,
    ) -> Self {
        NodeResolver {
            service,
            cache,
            retry,
            call_timeout,
            fallback_timeout,
        }
    }

    /// Resolve one node's configuration. A cache hit returns immediately
    /// with no external call and no retry accounting.
    pub async fn resolve(&self, node: &AstNode) -> Result<JsonMap, ResolveError> {
        let safe = build_safe_node(node);
        let projection = serde_json::to_value(&safe).unwrap_or(Value::Null);
        let key = content_key(&projection);

        if let Some(Value::Object(hit)) = self.cache.get(&key) {
            debug!(node = %node.id, "using cached config");
            return Ok(hit);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call(&safe, ResolutionMode::Primary, self.call_timeout).await {
                Ok(config) => {
                    self.cache.insert(key, Value::Object(config.clone()));
                    return Ok(config);
                }
                Err(cause) if cause.triggers_fallback() => {
                    warn!(node = %node.id, %cause, "retrying in conservative mode");
                    return match self
                        .call(&safe, ResolutionMode::Conservative, self.fallback_timeout)
                        .await
                    {
                        Ok(config) => {
                            self.cache.insert(key, Value::Object(config.clone()));
                            Ok(config)
                        }
                        Err(cause) => Err(ResolveError {
                            node_id: node.id.clone(),
                            cause,
                        }),
                    };
                }
                Err(cause) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    debug!(node = %node.id, %cause, attempt, delay_ms = delay.as_millis() as u64,
                           "interpretation attempt failed; backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(cause) => {
                    return Err(ResolveError {
                        node_id: node.id.clone(),
                        cause,
                    });
                }
            }
        }
    }

    /// Resolve every node, bounded by `concurrency`. Each node's outcome is
    /// reported individually so the orchestrator can recover per node.
    pub async fn resolve_workflow(
        &self,
        ast: &WorkflowAst,
        concurrency: usize,
    ) -> Vec<(String, Result<JsonMap, ResolveError>)> {
        let tasks = ast.nodes.values().map(|node| async move {
            let result = self.resolve(node).await;
            (node.id.clone(), result)
        });
        futures_util::stream::iter(tasks)
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    async fn call(
        &self,
        node: &SafeNode,
        mode: ResolutionMode,
        timeout: Duration,
    ) -> Result<JsonMap, InterpretError> {
        let payload = tokio::time::timeout(timeout, self.service.interpret(node, mode))
            .await
            .map_err(|_| InterpretError::Timeout)??;
        match payload.get("resolved_config") {
            Some(Value::Object(config)) => Ok(config.clone()),
            _ => Err(InterpretError::MissingResolvedConfig),
        }
    }
}
