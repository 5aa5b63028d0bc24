//! Wiring configuration, concept files and the index into a resolver.

use std::sync::Arc;

use anyhow::{Context, Result};
use setu_map::{BatchOrchestrator, MappingResolver, SetuConfig, TracingAuditSink};
use setu_model::{CodingSystem, ResolveOptions};
use setu_standards::{ConceptSource, load_concept_files};
use tracing::{info, info_span};

/// Per-invocation overrides of the `[resolver]` config section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionOverrides {
    pub k: Option<usize>,
    pub threshold: Option<f32>,
    pub lexical_bonus: Option<f32>,
    pub min_similarity: Option<f32>,
}

impl OptionOverrides {
    pub fn apply(&self, base: ResolveOptions) -> ResolveOptions {
        ResolveOptions {
            k: self.k.unwrap_or(base.k),
            threshold: self.threshold.unwrap_or(base.threshold),
            lexical_bonus: self.lexical_bonus.unwrap_or(base.lexical_bonus),
            min_similarity: self.min_similarity.unwrap_or(base.min_similarity),
        }
    }
}

/// A loaded repository with every non-empty system indexed.
#[derive(Debug)]
pub struct Session {
    config: SetuConfig,
    options: ResolveOptions,
    resolver: Arc<MappingResolver>,
    systems: Vec<CodingSystem>,
}

impl Session {
    pub fn open(
        config: SetuConfig,
        overrides: &OptionOverrides,
        sources: &[ConceptSource],
    ) -> Result<Self> {
        let span = info_span!("session", sources = sources.len());
        let _enter = span.enter();

        let options = overrides.apply(config.resolver);
        options.validate().context("invalid resolver options")?;

        let repository = load_concept_files(sources).context("load concept files")?;
        let systems: Vec<CodingSystem> = repository.systems().collect();
        let index = Arc::new(config.build_index());
        let resolver = MappingResolver::new(Arc::new(repository), index)
            .with_audit(Arc::new(TracingAuditSink));

        for system in &systems {
            let version = resolver
                .rebuild_index(*system)
                .with_context(|| format!("index {system}"))?;
            info!(system = %system, version, "index ready");
        }

        Ok(Self {
            config,
            options,
            resolver: Arc::new(resolver),
            systems,
        })
    }

    pub fn config(&self) -> &SetuConfig {
        &self.config
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn resolver(&self) -> &MappingResolver {
        &self.resolver
    }

    /// Systems that received concepts and have an index.
    pub fn systems(&self) -> &[CodingSystem] {
        &self.systems
    }

    /// A batch runner; `workers` overrides `[batch] workers`.
    pub fn orchestrator(&self, workers: Option<usize>) -> Result<BatchOrchestrator> {
        match workers.or(self.config.batch.workers) {
            Some(workers) => BatchOrchestrator::with_workers(Arc::clone(&self.resolver), workers)
                .context("build batch worker pool"),
            None => Ok(BatchOrchestrator::new(Arc::clone(&self.resolver))),
        }
    }
}
