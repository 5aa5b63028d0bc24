//! Immutable per-system index snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use setu_model::{CodingSystem, Concept};
use setu_normalization::{LanguageHint, Normalizer};

use crate::{Embedder, IndexError, cosine_similarity};

/// One concept with its normalized terms and their vectors.
#[derive(Debug, Clone)]
pub struct IndexedConcept {
    pub concept: Arc<Concept>,
    /// Distinct normalized forms of the display and synonyms, display first.
    pub terms: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl IndexedConcept {
    /// Normalize and embed every term of a concept.
    pub fn build(
        concept: Concept,
        normalizer: &Normalizer,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexError> {
        let mut terms: Vec<String> = Vec::new();
        for term in concept.terms() {
            let normalized = normalizer.normalize(term, LanguageHint::Auto);
            if !normalized.is_empty() && !terms.contains(&normalized) {
                terms.push(normalized);
            }
        }
        let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
        let vectors = embedder.embed_batch(&refs)?;
        for vector in &vectors {
            if vector.len() != embedder.dimension() {
                return Err(IndexError::DimensionMismatch {
                    expected: embedder.dimension(),
                    actual: vector.len(),
                });
            }
        }
        Ok(Self {
            concept: Arc::new(concept),
            terms,
            vectors,
        })
    }

    pub fn code(&self) -> &str {
        self.concept.code.as_str()
    }

    /// Returns true if a normalized term equals one of this concept's terms.
    pub fn has_term(&self, normalized: &str) -> bool {
        self.terms.iter().any(|term| term == normalized)
    }

    /// Best similarity of `vector` against any term of this concept.
    pub fn best_similarity(&self, vector: &[f32]) -> f32 {
        self.vectors
            .iter()
            .map(|v| cosine_similarity(v, vector))
            .fold(0.0, f32::max)
    }
}

/// A retrieved concept and its similarity to the query vector.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub entry: &'a IndexedConcept,
    pub similarity: f32,
}

/// Read-only index of one coding system at one version.
///
/// Snapshots are never mutated after publication; updates build a new
/// snapshot and swap it in. Entries are shared between successive snapshots,
/// so publishing one changed concept copies pointers, not vectors.
#[derive(Debug)]
pub struct SystemSnapshot {
    system: CodingSystem,
    version: u64,
    dimension: usize,
    /// Ordered by code, codes unique.
    entries: Vec<Arc<IndexedConcept>>,
}

impl SystemSnapshot {
    /// Assemble a snapshot from prepared entries.
    ///
    /// Entries must all belong to `system`. Duplicate codes keep the first entry.
    pub fn from_entries<E>(
        system: CodingSystem,
        version: u64,
        dimension: usize,
        entries: impl IntoIterator<Item = E>,
    ) -> Result<Self, IndexError>
    where
        E: Into<Arc<IndexedConcept>>,
    {
        let mut kept: Vec<Arc<IndexedConcept>> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for entry in entries {
            let entry: Arc<IndexedConcept> = entry.into();
            check_system(system, &entry)?;
            if seen.insert(entry.code().to_string()) {
                kept.push(entry);
            }
        }
        kept.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(Self {
            system,
            version,
            dimension,
            entries: kept,
        })
    }

    /// A copy of this snapshot at `version` with `entry` inserted, replacing
    /// any entry with the same code.
    pub fn with_entry(
        &self,
        version: u64,
        entry: Arc<IndexedConcept>,
    ) -> Result<Self, IndexError> {
        check_system(self.system, &entry)?;
        let mut entries = self.entries.clone();
        match self.position(entry.code()) {
            Ok(i) => entries[i] = entry,
            Err(i) => entries.insert(i, entry),
        }
        Ok(Self {
            system: self.system,
            version,
            dimension: self.dimension,
            entries,
        })
    }

    /// Normalize and embed concepts in parallel, then assemble a snapshot.
    pub fn build(
        system: CodingSystem,
        version: u64,
        concepts: Vec<Concept>,
        normalizer: &Normalizer,
        embedder: &dyn Embedder,
    ) -> Result<Self, IndexError> {
        let entries = prepare_entries(system, concepts, normalizer, embedder)?;
        Self::from_entries(system, version, embedder.dimension(), entries)
    }

    pub fn system(&self) -> CodingSystem {
        self.system
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, code: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| entry.code().cmp(code))
    }

    pub fn get(&self, code: &str) -> Option<&IndexedConcept> {
        self.position(code).ok().map(|i| self.entries[i].as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedConcept> {
        self.entries.iter().map(Arc::as_ref)
    }

    /// Up to `k` concepts by descending best-term similarity.
    ///
    /// Ties are broken by the lexicographically smaller code. Concepts with
    /// zero similarity are not neighbours.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor<'_>>, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut neighbors: Vec<Neighbor<'_>> = self
            .iter()
            .filter_map(|entry| {
                let similarity = entry.best_similarity(vector);
                (similarity > 0.0).then_some(Neighbor { entry, similarity })
            })
            .collect();
        neighbors.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.entry.code().cmp(b.entry.code()))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn check_system(system: CodingSystem, entry: &IndexedConcept) -> Result<(), IndexError> {
    if entry.concept.system == system {
        return Ok(());
    }
    Err(IndexError::SystemMismatch {
        expected: system,
        actual: entry.concept.system,
        code: entry.code().to_string(),
    })
}

pub(crate) fn prepare_entries(
    system: CodingSystem,
    concepts: Vec<Concept>,
    normalizer: &Normalizer,
    embedder: &dyn Embedder,
) -> Result<Vec<IndexedConcept>, IndexError> {
    if let Some(stray) = concepts.iter().find(|c| c.system != system) {
        return Err(IndexError::SystemMismatch {
            expected: system,
            actual: stray.system,
            code: stray.code.to_string(),
        });
    }
    concepts
        .into_par_iter()
        .map(|concept| IndexedConcept::build(concept, normalizer, embedder))
        .collect()
}
