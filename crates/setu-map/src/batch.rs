//! Batch orchestration.
//!
//! Items are resolved independently, possibly in parallel, and written back
//! to the slot of their request so the report has exactly one item per
//! request in request order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use setu_model::{MappingResult, ResolutionStatus, ResolveOptions};
use tracing::{debug, info, info_span};

use crate::error::ResolveError;
use crate::resolver::MappingResolver;

/// One request in boundary form; systems are parsed per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub source_system: String,
    pub source_code: String,
    pub target_system: String,
}

impl BatchRequest {
    pub fn new(
        source_system: impl Into<String>,
        source_code: impl Into<String>,
        target_system: impl Into<String>,
    ) -> Self {
        Self {
            source_system: source_system.into(),
            source_code: source_code.into(),
            target_system: target_system.into(),
        }
    }
}

/// Cooperative cancellation shared between a caller and a running batch.
///
/// Items already started finish; items not yet started become
/// [`BatchItem::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one batch request.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Resolved(MappingResult),
    Failed(ResolveError),
    Cancelled,
}

impl BatchItem {
    pub fn result(&self) -> Option<&MappingResult> {
        match self {
            Self::Resolved(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ResolveError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Counts per outcome. Cancelled items are not failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub partial: usize,
    pub not_found: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_items(items: &[BatchItem]) -> Self {
        let mut summary = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            match item {
                BatchItem::Resolved(result) => match result.status {
                    ResolutionStatus::Matched => summary.matched += 1,
                    ResolutionStatus::Partial => summary.partial += 1,
                    ResolutionStatus::NotFound => summary.not_found += 1,
                },
                BatchItem::Failed(_) => summary.failed += 1,
                BatchItem::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

/// Ordered outcomes of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn results(&self) -> impl Iterator<Item = &MappingResult> {
        self.items.iter().filter_map(BatchItem::result)
    }
}

/// Runs the resolver over many requests.
pub struct BatchOrchestrator {
    resolver: Arc<MappingResolver>,
    pool: Option<ThreadPool>,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field(
                "workers",
                &self.pool.as_ref().map(ThreadPool::current_num_threads),
            )
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    /// Use the global rayon pool.
    pub fn new(resolver: Arc<MappingResolver>) -> Self {
        Self {
            resolver,
            pool: None,
        }
    }

    /// Use a dedicated pool of `workers` threads.
    pub fn with_workers(
        resolver: Arc<MappingResolver>,
        workers: usize,
    ) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("setu-batch-{i}"))
            .build()?;
        Ok(Self {
            resolver,
            pool: Some(pool),
        })
    }

    pub fn resolver(&self) -> &MappingResolver {
        &self.resolver
    }

    /// Resolve every request; the report has one item per request, in order.
    pub fn resolve_batch(
        &self,
        requests: &[BatchRequest],
        options: &ResolveOptions,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let span = info_span!("resolve_batch", requests = requests.len());
        let _enter = span.enter();
        let started = Instant::now();

        let run = || -> Vec<BatchItem> {
            requests
                .par_iter()
                .map(|request| self.resolve_item(request, options, cancel))
                .collect()
        };
        let items = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let summary = BatchSummary::from_items(&items);
        info!(
            total = summary.total,
            matched = summary.matched,
            partial = summary.partial,
            not_found = summary.not_found,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        BatchReport { items, summary }
    }

    fn resolve_item(
        &self,
        request: &BatchRequest,
        options: &ResolveOptions,
        cancel: &CancellationToken,
    ) -> BatchItem {
        if cancel.is_cancelled() {
            return BatchItem::Cancelled;
        }
        match self.resolver.resolve_raw(
            &request.source_system,
            &request.source_code,
            &request.target_system,
            options,
        ) {
            Ok(result) => BatchItem::Resolved(result),
            Err(err) => {
                debug!(
                    code = %request.source_code,
                    kind = err.kind(),
                    error = %err,
                    "batch item failed"
                );
                BatchItem::Failed(err)
            }
        }
    }
}
