//! Read-only access to the canonical concept store.
//!
//! The store itself is maintained outside this workspace. Resolution only
//! needs exact-code lookup; index builds need a full listing per system.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::{CodingSystem, Concept, RepositoryError};

/// Boundary to the concept store.
///
/// Implementations must complete or fail within a bounded time; a store that
/// cannot be reached reports [`RepositoryError::Unavailable`].
pub trait ConceptRepository: Send + Sync {
    /// Exact-code lookup. A missing code is `Ok(None)`.
    fn get_concept(
        &self,
        system: CodingSystem,
        code: &str,
    ) -> Result<Option<Concept>, RepositoryError>;

    /// All concepts of a system, ordered by code.
    fn list_concepts(&self, system: CodingSystem) -> Result<Vec<Concept>, RepositoryError>;
}

impl<R: ConceptRepository + ?Sized> ConceptRepository for Arc<R> {
    fn get_concept(
        &self,
        system: CodingSystem,
        code: &str,
    ) -> Result<Option<Concept>, RepositoryError> {
        (**self).get_concept(system, code)
    }

    fn list_concepts(&self, system: CodingSystem) -> Result<Vec<Concept>, RepositoryError> {
        (**self).list_concepts(system)
    }
}

/// Immutable in-memory snapshot of the concept store.
///
/// Lookups take no locks; a refreshed store is a new repository value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConceptRepository {
    systems: BTreeMap<CodingSystem, BTreeMap<String, Concept>>,
}

impl InMemoryConceptRepository {
    pub fn builder() -> InMemoryRepositoryBuilder {
        InMemoryRepositoryBuilder::default()
    }

    /// Build a repository from concepts, keeping the first occurrence of a code.
    pub fn from_concepts(concepts: impl IntoIterator<Item = Concept>) -> Self {
        let mut builder = Self::builder();
        builder.extend(concepts);
        builder.build()
    }

    /// Number of concepts held for a system.
    pub fn len(&self, system: CodingSystem) -> usize {
        self.systems.get(&system).map_or(0, BTreeMap::len)
    }

    /// Total number of concepts across systems.
    pub fn total(&self) -> usize {
        self.systems.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Systems with at least one concept.
    pub fn systems(&self) -> impl Iterator<Item = CodingSystem> + '_ {
        self.systems
            .iter()
            .filter(|(_, concepts)| !concepts.is_empty())
            .map(|(system, _)| *system)
    }
}

impl ConceptRepository for InMemoryConceptRepository {
    fn get_concept(
        &self,
        system: CodingSystem,
        code: &str,
    ) -> Result<Option<Concept>, RepositoryError> {
        Ok(self
            .systems
            .get(&system)
            .and_then(|concepts| concepts.get(code.trim()))
            .cloned())
    }

    fn list_concepts(&self, system: CodingSystem) -> Result<Vec<Concept>, RepositoryError> {
        Ok(self
            .systems
            .get(&system)
            .map(|concepts| concepts.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// Builder for [`InMemoryConceptRepository`].
#[derive(Debug, Default)]
pub struct InMemoryRepositoryBuilder {
    systems: BTreeMap<CodingSystem, BTreeMap<String, Concept>>,
    duplicates: usize,
}

impl InMemoryRepositoryBuilder {
    /// Add a concept. Returns false if the code was already present.
    pub fn insert(&mut self, concept: Concept) -> bool {
        let concepts = self.systems.entry(concept.system).or_default();
        let key = concept.code.as_str().to_string();
        if concepts.contains_key(&key) {
            debug!(system = %concept.system, code = %concept.code, "duplicate concept code skipped");
            self.duplicates += 1;
            return false;
        }
        concepts.insert(key, concept);
        true
    }

    pub fn extend(&mut self, concepts: impl IntoIterator<Item = Concept>) {
        for concept in concepts {
            self.insert(concept);
        }
    }

    /// Number of concepts skipped as duplicates.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn build(self) -> InMemoryConceptRepository {
        InMemoryConceptRepository {
            systems: self.systems,
        }
    }
}
