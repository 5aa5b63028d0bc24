use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use proptest::prelude::*;
use setu_index::{Embedder, EmbeddingIndex, HashingEmbedder, IndexError, IndexedConcept};
use setu_model::{
    CodingSystem, Concept, ConceptCode, ConceptRepository, InMemoryConceptRepository,
    RepositoryError,
};
use setu_normalization::Normalizer;

fn concept(system: CodingSystem, code: &str, display: &str) -> Concept {
    Concept::new(system, ConceptCode::new(code).expect("valid code"), display)
}

fn new_index() -> EmbeddingIndex {
    EmbeddingIndex::new(Arc::new(HashingEmbedder::default()), Normalizer::new())
}

#[test]
fn queries_stay_within_the_requested_system() {
    let index = new_index();
    index
        .rebuild(
            CodingSystem::SnomedCt,
            vec![concept(CodingSystem::SnomedCt, "386661006", "Fever (disorder)")],
        )
        .expect("rebuild snomed");
    index
        .rebuild(
            CodingSystem::Icd11Tm2,
            vec![concept(CodingSystem::Icd11Tm2, "SM00", "Fever disorder (TM2)")],
        )
        .expect("rebuild tm2");

    let vector = index.embed_text("fever").expect("embed");
    let hits = index
        .query(CodingSystem::SnomedCt, &vector, 10)
        .expect("query");
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hit| hit.concept.system == CodingSystem::SnomedCt));
}

#[test]
fn rebuild_rejects_concepts_from_other_systems() {
    let index = new_index();
    let err = index
        .rebuild(
            CodingSystem::SnomedCt,
            vec![concept(CodingSystem::Loinc, "8310-5", "Body temperature")],
        )
        .expect_err("mismatch");
    assert!(matches!(err, IndexError::SystemMismatch { .. }));
    assert!(!index.is_available(CodingSystem::SnomedCt));
}

#[test]
fn rebuild_is_idempotent() {
    let index = new_index();
    let concepts = vec![
        concept(CodingSystem::SnomedCt, "386661006", "Fever (disorder)").with_synonym("Pyrexia"),
        concept(CodingSystem::SnomedCt, "25064002", "Headache (finding)"),
    ];
    let v1 = index
        .rebuild(CodingSystem::SnomedCt, concepts.clone())
        .expect("first rebuild");
    let vector = index.embed_text("pyrexia").expect("embed");
    let first: Vec<(String, f32)> = index
        .query(CodingSystem::SnomedCt, &vector, 5)
        .expect("query")
        .into_iter()
        .map(|hit| (hit.concept.code.to_string(), hit.similarity))
        .collect();

    let v2 = index
        .rebuild(CodingSystem::SnomedCt, concepts)
        .expect("second rebuild");
    let second: Vec<(String, f32)> = index
        .query(CodingSystem::SnomedCt, &vector, 5)
        .expect("query")
        .into_iter()
        .map(|hit| (hit.concept.code.to_string(), hit.similarity))
        .collect();

    assert!(v2 > v1);
    assert_eq!(first, second);
}

struct OfflineRepository;

impl ConceptRepository for OfflineRepository {
    fn get_concept(
        &self,
        system: CodingSystem,
        _code: &str,
    ) -> Result<Option<Concept>, RepositoryError> {
        Err(RepositoryError::Unavailable {
            system,
            message: "connection refused".to_string(),
        })
    }

    fn list_concepts(&self, system: CodingSystem) -> Result<Vec<Concept>, RepositoryError> {
        Err(RepositoryError::Unavailable {
            system,
            message: "connection refused".to_string(),
        })
    }
}

#[test]
fn rebuild_from_repository_uses_listing() {
    let index = new_index();
    let repo = InMemoryConceptRepository::from_concepts([
        concept(CodingSystem::Loinc, "8310-5", "Body temperature"),
        concept(CodingSystem::Loinc, "8867-4", "Heart rate"),
    ]);
    index
        .rebuild_from_repository(&repo, CodingSystem::Loinc)
        .expect("rebuild");
    assert_eq!(index.snapshot(CodingSystem::Loinc).expect("snapshot").len(), 2);

    let err = index
        .rebuild_from_repository(&OfflineRepository, CodingSystem::Namaste)
        .expect_err("offline");
    assert!(matches!(err, IndexError::Repository(_)));
    assert!(!index.is_available(CodingSystem::Namaste));
}

#[test]
fn concurrent_rebuilds_publish_whole_snapshots() {
    let index = Arc::new(new_index());
    let generation = |prefix: &str| -> Vec<Concept> {
        ["fever", "pyrexia", "febrile illness", "high temperature"]
            .iter()
            .enumerate()
            .map(|(i, display)| {
                concept(CodingSystem::SnomedCt, &format!("{prefix}{i}"), display)
            })
            .collect()
    };
    let left = generation("A");
    let right = generation("B");
    index
        .rebuild(CodingSystem::SnomedCt, left.clone())
        .expect("initial rebuild");

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let index = Arc::clone(&index);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            for round in 0..50 {
                let concepts = if round % 2 == 0 { right.clone() } else { left.clone() };
                index
                    .rebuild(CodingSystem::SnomedCt, concepts)
                    .expect("rebuild");
            }
            stop.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let vector = index.embed_text("fever").expect("embed");
                while !stop.load(Ordering::SeqCst) {
                    let snapshot = index.snapshot(CodingSystem::SnomedCt).expect("snapshot");
                    let hits = snapshot.query(&vector, 10).expect("query");
                    let prefixes: Vec<char> = hits
                        .iter()
                        .filter_map(|hit| hit.entry.code().chars().next())
                        .collect();
                    assert_eq!(snapshot.len(), 4);
                    assert!(prefixes.windows(2).all(|pair| pair[0] == pair[1]));
                }
            })
        })
        .collect();

    writer.join().expect("writer");
    for reader in readers {
        reader.join().expect("reader");
    }
}

/// Blocks while embedding the term "gate" until released.
struct GatedEmbedder {
    inner: HashingEmbedder,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl Embedder for GatedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        if text == "gate" {
            if let Some(entered) = self.entered.lock().expect("lock").take() {
                entered.send(()).expect("signal");
            }
            if let Some(release) = self.release.lock().expect("lock").take() {
                release.recv().expect("release");
            }
        }
        self.inner.embed(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

#[test]
fn concept_indexed_during_rebuild_survives_it() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let embedder = GatedEmbedder {
        inner: HashingEmbedder::new(64),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
    };
    let index = Arc::new(EmbeddingIndex::new(Arc::new(embedder), Normalizer::new()));

    let rebuild = {
        let index = Arc::clone(&index);
        thread::spawn(move || {
            index.rebuild(
                CodingSystem::SnomedCt,
                vec![concept(CodingSystem::SnomedCt, "100", "gate")],
            )
        })
    };

    entered_rx.recv().expect("rebuild is embedding");
    let inserted = index
        .index(concept(CodingSystem::SnomedCt, "200", "cough"))
        .expect("index");
    release_tx.send(()).expect("release");
    let rebuilt = rebuild.join().expect("rebuild thread").expect("rebuild");

    assert!(rebuilt > inserted);
    let snapshot = index.snapshot(CodingSystem::SnomedCt).expect("snapshot");
    let codes: Vec<&str> = snapshot.iter().map(IndexedConcept::code).collect();
    assert_eq!(codes, vec!["100", "200"]);
}

proptest! {
    #[test]
    fn query_is_bounded_and_sorted(k in 0usize..8, text in "[a-z]{1,8}( [a-z]{1,8})?") {
        let index = new_index();
        let concepts: Vec<Concept> = ["fever", "fever chills", "cough", "dry cough", "headache", "rash"]
            .iter()
            .enumerate()
            .map(|(i, display)| concept(CodingSystem::SnomedCt, &format!("C{i}"), display))
            .collect();
        index.rebuild(CodingSystem::SnomedCt, concepts).expect("rebuild");
        let vector = index.embed_text(&text).expect("embed");
        let hits = index.query(CodingSystem::SnomedCt, &vector, k).expect("query");
        prop_assert!(hits.len() <= k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
            if pair[0].similarity == pair[1].similarity {
                prop_assert!(pair[0].concept.code < pair[1].concept.code);
            }
        }
        prop_assert!(hits.iter().all(|hit| (0.0..=1.0).contains(&hit.similarity)));
    }
}
