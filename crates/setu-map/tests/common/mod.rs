#![allow(dead_code)]

use std::sync::Arc;

use setu_index::{EmbeddingIndex, HashingEmbedder};
use setu_map::MappingResolver;
use setu_model::{CodingSystem, Concept, ConceptCode, InMemoryConceptRepository};
use setu_normalization::Normalizer;

pub fn concept(system: CodingSystem, code: &str, display: &str, synonyms: &[&str]) -> Concept {
    Concept::new(system, ConceptCode::new(code).expect("valid code"), display)
        .with_synonyms(synonyms.iter().copied())
}

pub fn concepts() -> Vec<Concept> {
    vec![
        concept(CodingSystem::Namaste, "NAMC001", "jvara", &["fever"]).with_language("sa"),
        concept(CodingSystem::Namaste, "NAMC002", "kasa", &["cough"]).with_language("sa"),
        concept(CodingSystem::Namaste, "NAMC003", "shirahshula", &["headache"]).with_language("sa"),
        concept(CodingSystem::Namaste, "NAMC004", "jvara bheda", &["fevers"]).with_language("sa"),
        concept(CodingSystem::Namaste, "NAMC009", "vatavyadhi", &[]).with_language("sa"),
        concept(
            CodingSystem::SnomedCt,
            "386661006",
            "Fever (disorder)",
            &["Pyrexia"],
        ),
        concept(
            CodingSystem::SnomedCt,
            "7520000",
            "Pyrexia of unknown origin (disorder)",
            &[],
        ),
        concept(CodingSystem::SnomedCt, "49727002", "Cough (finding)", &[]),
        concept(CodingSystem::SnomedCt, "25064002", "Headache (finding)", &[]),
        concept(
            CodingSystem::SnomedCt,
            "271807003",
            "Eruption of skin (disorder)",
            &["Rash"],
        ),
        concept(
            CodingSystem::Icd11Tm2,
            "SM00",
            "Fever disorder (TM2)",
            &["jwara"],
        ),
    ]
}

pub fn repository() -> Arc<InMemoryConceptRepository> {
    Arc::new(InMemoryConceptRepository::from_concepts(concepts()))
}

/// Resolver with indexes published for NAMASTE, SNOMED CT and ICD-11 TM2.
pub fn resolver() -> MappingResolver {
    let repository = repository();
    let index = Arc::new(EmbeddingIndex::new(
        Arc::new(HashingEmbedder::default()),
        Normalizer::new(),
    ));
    let resolver = MappingResolver::new(repository, index);
    for system in [
        CodingSystem::Namaste,
        CodingSystem::SnomedCt,
        CodingSystem::Icd11Tm2,
    ] {
        resolver.rebuild_index(system).expect("rebuild index");
    }
    resolver
}
