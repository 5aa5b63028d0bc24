//! The mapping resolver.

use std::collections::HashMap;
use std::sync::Arc;

use setu_index::{EmbeddingIndex, IndexedConcept};
use setu_model::{
    AuditEvent, CodingSystem, Concept, ConceptRepository, MappingCandidate, MappingRelation,
    MappingResult, OptionsError, ResolutionStatus, ResolveOptions, SearchHit,
};
use setu_normalization::LanguageHint;
use tracing::{debug, debug_span};

use crate::audit::{AuditSink, NoopAuditSink};
use crate::error::ResolveError;
use crate::score::score_candidate;

/// Resolves a concept of one coding system to ranked concepts of another.
///
/// Resolution reads the repository and one index snapshot and mutates
/// neither. Results are deterministic for a given snapshot and options.
pub struct MappingResolver {
    repository: Arc<dyn ConceptRepository>,
    index: Arc<EmbeddingIndex>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for MappingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingResolver")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl MappingResolver {
    pub fn new(repository: Arc<dyn ConceptRepository>, index: Arc<EmbeddingIndex>) -> Self {
        Self {
            repository,
            index,
            audit: Arc::new(NoopAuditSink),
        }
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn repository(&self) -> &dyn ConceptRepository {
        self.repository.as_ref()
    }

    /// Rebuild the index of `system` from the repository.
    ///
    /// Safe to call while resolutions run; they keep the snapshot they started with.
    pub fn rebuild_index(&self, system: CodingSystem) -> Result<u64, ResolveError> {
        self.index
            .rebuild_from_repository(self.repository.as_ref(), system)
            .map_err(|err| ResolveError::from_index(system, err))
    }

    /// Resolve with coding systems given as identifiers.
    ///
    /// Both identifiers are parsed before any lookup.
    pub fn resolve_raw(
        &self,
        source_system: &str,
        source_code: &str,
        target_system: &str,
        options: &ResolveOptions,
    ) -> Result<MappingResult, ResolveError> {
        let source_system = parse_system(source_system)?;
        let target_system = parse_system(target_system)?;
        self.resolve(source_system, source_code, target_system, options)
    }

    /// Map `source_code` of `source_system` onto concepts of `target_system`.
    pub fn resolve(
        &self,
        source_system: CodingSystem,
        source_code: &str,
        target_system: CodingSystem,
        options: &ResolveOptions,
    ) -> Result<MappingResult, ResolveError> {
        options.validate()?;

        let span = debug_span!(
            "resolve",
            source = %source_system,
            code = source_code,
            target = %target_system
        );
        let _enter = span.enter();

        let source = self
            .repository
            .get_concept(source_system, source_code)?
            .ok_or_else(|| ResolveError::NotFound {
                system: source_system,
                code: source_code.trim().to_string(),
            })?;

        let snapshot = self
            .index
            .snapshot(target_system)
            .map_err(|err| ResolveError::from_index(target_system, err))?;

        let normalizer = self.index.normalizer();
        let mut source_terms: Vec<String> = Vec::new();
        for term in source.terms() {
            let normalized = normalizer.normalize(term, LanguageHint::Auto);
            if !normalized.is_empty() && !source_terms.contains(&normalized) {
                source_terms.push(normalized);
            }
        }

        let embedder = self.index.embedder();
        let mut best: HashMap<&str, (&IndexedConcept, f32)> = HashMap::new();
        for term in &source_terms {
            let vector = embedder
                .embed(term)
                .map_err(|err| ResolveError::from_index(target_system, err))?;
            let neighbors = snapshot
                .query(&vector, options.k)
                .map_err(|err| ResolveError::from_index(target_system, err))?;
            for neighbor in neighbors {
                let slot = best
                    .entry(neighbor.entry.code())
                    .or_insert((neighbor.entry, neighbor.similarity));
                if neighbor.similarity > slot.1 {
                    slot.1 = neighbor.similarity;
                }
            }
        }

        let source_ref = source.to_ref();
        let mut candidates: Vec<MappingCandidate> = best
            .into_values()
            .filter(|(_, similarity)| *similarity >= options.min_similarity)
            .map(|(entry, similarity)| {
                let score = score_candidate(&source_terms, entry, similarity, options);
                MappingCandidate {
                    source: source_ref.clone(),
                    target: entry.concept.to_ref(),
                    similarity: score.similarity,
                    lexical_bonus: score.lexical_bonus,
                    confidence: score.confidence,
                    rank: 0,
                    relation: MappingRelation::from_confidence(score.confidence),
                    breakdown: score.breakdown,
                    rationale: score.rationale,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.target.code.cmp(&b.target.code))
        });
        candidates.truncate(options.k);
        for (position, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = position + 1;
        }

        let status = ResolutionStatus::classify(
            candidates.first().map(|c| c.confidence),
            options.threshold,
        );
        debug!(
            status = %status,
            candidates = candidates.len(),
            version = snapshot.version(),
            "resolved"
        );

        let result = MappingResult {
            source,
            target_system,
            candidates,
            status,
            index_version: snapshot.version(),
        };
        self.audit.record(&AuditEvent::from_result(&result));
        Ok(result)
    }

    /// Concept of `system` with exactly `code`.
    pub fn lookup(&self, system: CodingSystem, code: &str) -> Result<Concept, ResolveError> {
        self.repository
            .get_concept(system, code)?
            .ok_or_else(|| ResolveError::NotFound {
                system,
                code: code.trim().to_string(),
            })
    }

    /// Up to `k` concepts of `system` closest in meaning to free text.
    ///
    /// Hits are ordered by descending similarity, then code. Text that
    /// normalizes to nothing has no neighbours and yields no hits.
    pub fn search(
        &self,
        system: CodingSystem,
        text: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, ResolveError> {
        if k == 0 {
            return Err(OptionsError::ZeroK.into());
        }
        let snapshot = self
            .index
            .snapshot(system)
            .map_err(|err| ResolveError::from_index(system, err))?;
        let vector = self
            .index
            .embed_text(text)
            .map_err(|err| ResolveError::from_index(system, err))?;
        let hits: Vec<SearchHit> = snapshot
            .query(&vector, k)
            .map_err(|err| ResolveError::from_index(system, err))?
            .into_iter()
            .enumerate()
            .map(|(position, neighbor)| SearchHit {
                concept: neighbor.entry.concept.to_ref(),
                similarity: neighbor.similarity,
                rank: position + 1,
            })
            .collect();
        debug!(system = %system, hits = hits.len(), "searched");
        Ok(hits)
    }
}

pub(crate) fn parse_system(value: &str) -> Result<CodingSystem, ResolveError> {
    value
        .parse()
        .map_err(|_| ResolveError::InvalidSystem(value.to_string()))
}
