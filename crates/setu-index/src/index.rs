//! The embedding index: one atomically published snapshot per coding system.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use setu_model::{CodingSystem, Concept, ConceptRepository};
use setu_normalization::{LanguageHint, Normalizer};
use tracing::{debug, info, info_span};

use crate::snapshot::{IndexedConcept, SystemSnapshot, prepare_entries};
use crate::{Embedder, IndexError};

/// A concept returned by [`EmbeddingIndex::query`].
#[derive(Debug, Clone)]
pub struct ScoredConcept {
    pub concept: Arc<Concept>,
    pub similarity: f32,
}

#[derive(Default)]
struct Slot {
    current: ArcSwapOption<SystemSnapshot>,
    /// Held while publishing. Records entries published by
    /// [`EmbeddingIndex::index`] since the last rebuild, with their versions.
    publish: Mutex<Vec<(u64, Arc<IndexedConcept>)>>,
}

/// Nearest-neighbour index over concept terms, scoped per coding system.
///
/// Readers load the current snapshot without locking. Writers compute vectors
/// first and hold the slot's publish lock only to swap the pointer, so a
/// query observes either the old or the new snapshot of a system.
///
/// A concept indexed while a rebuild of the same system is embedding survives
/// that rebuild: the rebuild overlays every insert published after it
/// started. Inserts published before the rebuild started are replaced by the
/// rebuild's concepts.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    normalizer: Normalizer,
    slots: [Slot; CodingSystem::COUNT],
    versions: AtomicU64,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let published: Vec<(CodingSystem, u64)> = CodingSystem::ALL
            .into_iter()
            .filter_map(|system| self.version(system).map(|v| (system, v)))
            .collect();
        f.debug_struct("EmbeddingIndex")
            .field("dimension", &self.embedder.dimension())
            .field("published", &published)
            .finish()
    }
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>, normalizer: Normalizer) -> Self {
        Self {
            embedder,
            normalizer,
            slots: Default::default(),
            versions: AtomicU64::new(0),
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Normalize then embed free text.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let normalized = self.normalizer.normalize(text, LanguageHint::Auto);
        self.embedder.embed(&normalized)
    }

    fn slot(&self, system: CodingSystem) -> &Slot {
        &self.slots[system.index()]
    }

    /// Insert or update one concept's vectors in its system's index.
    ///
    /// Returns the version of the published snapshot.
    pub fn index(&self, concept: Concept) -> Result<u64, IndexError> {
        let system = concept.system;
        let entry = Arc::new(IndexedConcept::build(
            concept,
            &self.normalizer,
            self.embedder.as_ref(),
        )?);
        let slot = self.slot(system);

        let mut inserted = slot.publish.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(system = %system, code = entry.code(), "indexing concept");
        let version = self.next_version();
        let snapshot = match slot.current.load_full() {
            Some(current) => current.with_entry(version, Arc::clone(&entry))?,
            None => SystemSnapshot::from_entries(
                system,
                version,
                self.dimension(),
                [Arc::clone(&entry)],
            )?,
        };
        inserted.push((version, entry));
        Ok(self.publish_locked(slot, snapshot))
    }

    /// Replace a system's index with vectors for `concepts`.
    ///
    /// Idempotent: rebuilding from the same concepts yields an index that
    /// answers queries identically, under a new version.
    pub fn rebuild(&self, system: CodingSystem, concepts: Vec<Concept>) -> Result<u64, IndexError> {
        let span = info_span!("rebuild_index", system = %system, concepts = concepts.len());
        let _enter = span.enter();
        let started = Instant::now();
        let baseline = self.versions.load(Ordering::SeqCst);

        let prepared = prepare_entries(system, concepts, &self.normalizer, self.embedder.as_ref())?;

        let slot = self.slot(system);
        let mut inserted = slot.publish.lock().unwrap_or_else(PoisonError::into_inner);
        // Latest insert first: the first entry per code wins.
        let concurrent: Vec<Arc<IndexedConcept>> = inserted
            .iter()
            .rev()
            .filter(|(version, _)| *version > baseline)
            .map(|(_, entry)| Arc::clone(entry))
            .collect();
        if !concurrent.is_empty() {
            debug!(inserts = concurrent.len(), "keeping concepts indexed during rebuild");
        }
        let entries = concurrent
            .into_iter()
            .chain(prepared.into_iter().map(Arc::new));
        let version = self.next_version();
        let snapshot = SystemSnapshot::from_entries(system, version, self.dimension(), entries)?;
        inserted.clear();
        self.publish_locked(slot, snapshot);
        info!(
            version,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index rebuilt"
        );
        Ok(version)
    }

    /// Rebuild a system's index from the concept store.
    pub fn rebuild_from_repository(
        &self,
        repository: &dyn ConceptRepository,
        system: CodingSystem,
    ) -> Result<u64, IndexError> {
        let concepts = repository.list_concepts(system)?;
        self.rebuild(system, concepts)
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Swap in `snapshot`; the caller holds the slot's publish lock.
    fn publish_locked(&self, slot: &Slot, snapshot: SystemSnapshot) -> u64 {
        let (system, version, size) = (snapshot.system(), snapshot.version(), snapshot.len());
        slot.current.store(Some(Arc::new(snapshot)));
        debug!(system = %system, version, concepts = size, "snapshot published");
        version
    }

    /// Current snapshot of a system.
    pub fn snapshot(&self, system: CodingSystem) -> Result<Arc<SystemSnapshot>, IndexError> {
        self.slot(system)
            .current
            .load_full()
            .ok_or(IndexError::Unavailable(system))
    }

    /// Up to `k` nearest concepts of `system` to `vector`.
    pub fn query(
        &self,
        system: CodingSystem,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredConcept>, IndexError> {
        let snapshot = self.snapshot(system)?;
        let neighbors = snapshot.query(vector, k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| ScoredConcept {
                concept: Arc::clone(&n.entry.concept),
                similarity: n.similarity,
            })
            .collect())
    }

    /// Drop a system's snapshot. Returns true if one was published.
    pub fn evict(&self, system: CodingSystem) -> bool {
        let slot = self.slot(system);
        let mut inserted = slot.publish.lock().unwrap_or_else(PoisonError::into_inner);
        inserted.clear();
        let evicted = slot.current.swap(None).is_some();
        if evicted {
            info!(system = %system, "index evicted");
        }
        evicted
    }

    pub fn version(&self, system: CodingSystem) -> Option<u64> {
        self.snapshot(system).ok().map(|snapshot| snapshot.version())
    }

    pub fn is_available(&self, system: CodingSystem) -> bool {
        self.slot(system).current.load().is_some()
    }
}
