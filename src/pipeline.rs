//! Pipeline orchestration: runs the stages in order and owns the
//! collaborators (interpretation service, cache, registries).

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::ast;
use crate::enrich::{self, CredentialRegistry};
use crate::error::CompileError;
use crate::interpret::{ConfigCache, InterpretationService, NodeResolver, RetryPolicy};
use crate::ir::{self, IrGraph};
use crate::migrate::MigrationRegistry;
use crate::{analyze, parse, validate};

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Upper bound on concurrent node resolutions.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Bound on one primary interpretation call.
    pub call_timeout: Duration,
    /// Bound on the single conservative fallback call.
    pub fallback_timeout: Duration,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            concurrency: 8,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(30),
            fallback_timeout: Duration::from_secs(45),
        }
    }
}

/// The workflow compiler. Collaborators are injected at construction time
/// so tests can substitute them; the cache lives as long as the compiler.
pub struct Compiler {
    service: Arc<dyn InterpretationService>,
    credentials: CredentialRegistry,
    migrations: MigrationRegistry,
    cache: Arc<ConfigCache>,
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(service: Arc<dyn InterpretationService>) -> Self {
        Compiler {
            service,
            credentials: CredentialRegistry::new(),
            migrations: MigrationRegistry::with_defaults(),
            cache: Arc::new(ConfigCache::new()),
            options: CompilerOptions::default(),
        }
    }

    pub fn with_credential_registry(mut self, registry: CredentialRegistry) -> Self {
        self.credentials = registry;
        self
    }

    pub fn with_migrations(mut self, registry: MigrationRegistry) -> Self {
        self.migrations = registry;
        self
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// The process-wide resolved-config cache (content-addressed, no
    /// invalidation).
    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Full compilation pipeline from export JSON to IR.
    pub async fn compile(&self, json: &str) -> Result<IrGraph, CompileError> {
        info!("loading workflow");
        let export = parse::parse(json)?;
        let (raw, audit) = parse::preprocess(&export);

        info!("migrating workflow schema");
        let raw = self.migrations.migrate_workflow(raw)?;

        info!("validating workflow structure");
        validate::validate_structure(&raw)?;

        info!("building AST");
        let mut ast = ast::normalize(&raw);

        info!("building connections");
        ast::connections::build_connections(&mut ast);

        info!("enriching metadata");
        enrich::enrich_metadata(&mut ast, &audit, &self.credentials)?;

        info!("resolving node configurations");
        let resolver = NodeResolver::new(
            Arc::clone(&self.service),
            Arc::clone(&self.cache),
            self.options.retry.clone(),
            self.options.call_timeout,
            self.options.fallback_timeout,
        );
        let results = resolver
            .resolve_workflow(&ast, self.options.concurrency)
            .await;
        for (node_id, result) in results {
            let Some(node) = ast.nodes.get_mut(&node_id) else { continue };
            match result {
                Ok(config) => node.resolved_config = config,
                Err(e) => {
                    // Degrade gracefully: a single node's failure falls
                    // back to its original authored config.
                    error!(node = %node_id, %e, "interpretation failed; using original config");
                    node.resolved_config = node.config.clone();
                }
            }
        }

        info!("running static analysis");
        let analysis = analyze::analyze_workflow(&ast);

        info!("generating IR");
        Ok(ir::generate_ir(&ast, analysis))
    }
}
