mod common;

use std::sync::Arc;

use setu_index::{EmbeddingIndex, HashingEmbedder};
use setu_map::{ChannelAuditSink, MappingResolver, ResolveError};
use setu_model::{
    CodingSystem, Concept, ConceptRepository, InMemoryConceptRepository, MappingRelation,
    OptionsError, RepositoryError, ResolutionStatus, ResolveOptions,
};
use setu_normalization::Normalizer;

use common::{concept, resolver};

#[test]
fn matches_fever_through_synonym() {
    let resolver = resolver();
    let result = resolver
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default().with_threshold(0.7),
        )
        .expect("resolve");

    assert_eq!(result.status, ResolutionStatus::Matched);
    let top = result.top().expect("top candidate");
    assert_eq!(top.target.code.as_str(), "386661006");
    assert_eq!(top.target.display, "Fever (disorder)");
    assert_eq!(top.rank, 1);
    assert_eq!(top.confidence, 1.0);
    assert_eq!(top.relation, MappingRelation::Exact);
    assert!(top.lexical_bonus > 0.0);
    assert!(top.rationale.contains("Direct synonym match found"));
    assert_eq!(
        Some(result.index_version),
        resolver.index().version(CodingSystem::SnomedCt)
    );
}

#[test]
fn unrelated_concept_is_not_found_without_error() {
    let result = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC009",
            CodingSystem::SnomedCt,
            &ResolveOptions::default(),
        )
        .expect("resolve");
    assert_eq!(result.status, ResolutionStatus::NotFound);
    assert!(result.candidates.is_empty());
}

#[test]
fn near_match_below_threshold_is_partial() {
    let result = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC004",
            CodingSystem::SnomedCt,
            &ResolveOptions::default().with_threshold(0.9),
        )
        .expect("resolve");
    assert_eq!(result.status, ResolutionStatus::Partial);
    assert_eq!(
        result.top().expect("top").target.code.as_str(),
        "386661006"
    );
    assert!(result.candidates.iter().all(|c| c.lexical_bonus == 0.0));
}

#[test]
fn candidates_are_ranked_and_scoped_to_target() {
    let resolver = resolver();
    for code in ["NAMC001", "NAMC002", "NAMC003", "NAMC004"] {
        let result = resolver
            .resolve(
                CodingSystem::Namaste,
                code,
                CodingSystem::SnomedCt,
                &ResolveOptions::default(),
            )
            .expect("resolve");
        assert!(result.is_ranked(), "{code} not ranked");
        for (position, candidate) in result.candidates.iter().enumerate() {
            assert_eq!(candidate.target.system, CodingSystem::SnomedCt);
            assert_eq!(candidate.rank, position + 1);
            assert!((0.0..=1.0).contains(&candidate.confidence));
        }
    }
}

#[test]
fn round_trip_returns_to_source() {
    let resolver = resolver();
    let options = ResolveOptions::default();
    let forward = resolver
        .resolve(CodingSystem::Namaste, "NAMC001", CodingSystem::SnomedCt, &options)
        .expect("forward");
    let top = forward.top().expect("top");

    let back = resolver
        .resolve(
            CodingSystem::SnomedCt,
            top.target.code.as_str(),
            CodingSystem::Namaste,
            &options,
        )
        .expect("back");
    assert!(
        back.candidates
            .iter()
            .any(|c| c.target.code.as_str() == "NAMC001")
    );
}

#[test]
fn romanization_variants_meet_across_systems() {
    let result = resolver()
        .resolve(
            CodingSystem::Icd11Tm2,
            "SM00",
            CodingSystem::Namaste,
            &ResolveOptions::default(),
        )
        .expect("resolve");
    let top = result.top().expect("top");
    assert_eq!(top.target.code.as_str(), "NAMC001");
    assert_eq!(result.status, ResolutionStatus::Matched);
}

#[test]
fn distinguishing_parentheticals_keep_concepts_apart() {
    let repository = Arc::new(InMemoryConceptRepository::from_concepts([
        concept(CodingSystem::Icd11Biomedicine, "X1", "Vitamin D (25-OH)", &[]),
        concept(CodingSystem::Loinc, "1989-3", "Vitamin D (25-OH)", &[]),
        concept(CodingSystem::Loinc, "1649-3", "Vitamin D (1,25-OH)", &[]),
    ]));
    let index = Arc::new(EmbeddingIndex::new(
        Arc::new(HashingEmbedder::default()),
        Normalizer::new(),
    ));
    let resolver = MappingResolver::new(repository, index);
    resolver.rebuild_index(CodingSystem::Loinc).expect("rebuild");

    let result = resolver
        .resolve(
            CodingSystem::Icd11Biomedicine,
            "X1",
            CodingSystem::Loinc,
            &ResolveOptions::default(),
        )
        .expect("resolve");
    let codes: Vec<&str> = result
        .candidates
        .iter()
        .map(|c| c.target.code.as_str())
        .collect();
    assert_eq!(codes.first(), Some(&"1989-3"));
    assert_eq!(result.top_confidence(), Some(1.0));
    if let Some(other) = result.candidates.get(1) {
        assert!(other.confidence < 1.0);
    }
}

#[test]
fn missing_source_is_not_found_error() {
    let err = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC404",
            CodingSystem::SnomedCt,
            &ResolveOptions::default(),
        )
        .expect_err("missing");
    assert_eq!(
        err,
        ResolveError::NotFound {
            system: CodingSystem::Namaste,
            code: "NAMC404".to_string()
        }
    );
    assert!(!err.is_retryable());
}

#[test]
fn unbuilt_target_index_is_unavailable() {
    let err = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::Loinc,
            &ResolveOptions::default(),
        )
        .expect_err("no loinc index");
    assert!(matches!(
        err,
        ResolveError::Unavailable {
            system: CodingSystem::Loinc,
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[test]
fn evicted_index_is_unavailable_not_empty() {
    let resolver = resolver();
    assert!(resolver.index().evict(CodingSystem::SnomedCt));
    let err = resolver
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default(),
        )
        .expect_err("evicted");
    assert_eq!(err.kind(), "UNAVAILABLE");
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
            message: "timed out".to_string(),
        })
    }

    fn list_concepts(&self, system: CodingSystem) -> Result<Vec<Concept>, RepositoryError> {
        Err(RepositoryError::Unavailable {
            system,
            message: "timed out".to_string(),
        })
    }
}

#[test]
fn repository_outage_is_unavailable() {
    let healthy = resolver();
    let offline = MappingResolver::new(
        Arc::new(OfflineRepository),
        Arc::new(EmbeddingIndex::new(
            Arc::new(HashingEmbedder::default()),
            Normalizer::new(),
        )),
    );
    let err = offline
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default(),
        )
        .expect_err("offline");
    assert!(matches!(err, ResolveError::Unavailable { .. }));
    assert!(offline.rebuild_index(CodingSystem::SnomedCt).is_err());
    assert!(healthy.index().is_available(CodingSystem::SnomedCt));
}

#[test]
fn identifiers_are_validated_before_lookup() {
    let resolver = resolver();
    let options = ResolveOptions::default();
    let err = resolver
        .resolve_raw("READ-V2", "NAMC001", "SNOMED-CT", &options)
        .expect_err("bad source system");
    assert_eq!(err, ResolveError::InvalidSystem("READ-V2".to_string()));

    let err = resolver
        .resolve_raw("NAMASTE", "NAMC404", "nowhere", &options)
        .expect_err("bad target system");
    assert_eq!(err.kind(), "INVALID_SYSTEM");

    let ok = resolver
        .resolve_raw("namaste", "NAMC001", "snomed", &options)
        .expect("aliases parse");
    assert_eq!(ok.target_system, CodingSystem::SnomedCt);
}

#[test]
fn invalid_options_are_rejected() {
    let err = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default().with_k(0),
        )
        .expect_err("k = 0");
    assert_eq!(err, ResolveError::InvalidOptions(OptionsError::ZeroK));
    assert_eq!(err.kind(), "INVALID_OPTIONS");

    let err = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default().with_threshold(2.0),
        )
        .expect_err("threshold above 1");
    assert_eq!(err, ResolveError::InvalidOptions(OptionsError::Threshold(2.0)));
}

#[test]
fn k_bounds_candidate_count() {
    let result = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default().with_k(1).with_min_similarity(0.0),
        )
        .expect("resolve");
    assert_eq!(result.candidates.len(), 1);
}

#[test]
fn every_resolution_emits_an_audit_event() {
    let (sink, events) = ChannelAuditSink::bounded(8);
    let resolver = resolver().with_audit(Arc::new(sink));
    let options = ResolveOptions::default();

    resolver
        .resolve(CodingSystem::Namaste, "NAMC001", CodingSystem::SnomedCt, &options)
        .expect("matched");
    resolver
        .resolve(CodingSystem::Namaste, "NAMC009", CodingSystem::SnomedCt, &options)
        .expect("not found status");
    let _ = resolver.resolve(CodingSystem::Namaste, "NAMC404", CodingSystem::SnomedCt, &options);

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].result_status, ResolutionStatus::Matched);
    assert_eq!(received[0].top_confidence, Some(1.0));
    assert_eq!(received[1].result_status, ResolutionStatus::NotFound);
    assert_eq!(received[1].top_confidence, None);
}

#[test]
fn results_serialize_for_callers() {
    let result = resolver()
        .resolve(
            CodingSystem::Namaste,
            "NAMC001",
            CodingSystem::SnomedCt,
            &ResolveOptions::default(),
        )
        .expect("resolve");
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["status"], "MATCHED");
    assert_eq!(json["target_system"], "SNOMED-CT");
    assert_eq!(json["candidates"][0]["relation"], "EXACT");
}

#[test]
fn free_text_search_ranks_concepts_of_one_system() {
    let resolver = resolver();
    let hits = resolver
        .search(CodingSystem::SnomedCt, "Pyrexia", 3)
        .expect("search");
    assert!(!hits.is_empty() && hits.len() <= 3);
    assert_eq!(hits[0].concept.code.as_str(), "386661006");
    assert_eq!(hits[0].rank, 1);
    assert!(hits[0].similarity > 0.99);
    assert!(hits.iter().all(|hit| hit.concept.system == CodingSystem::SnomedCt));
    assert!(hits.windows(2).all(|pair| pair[0].similarity >= pair[1].similarity));

    let devanagari = resolver
        .search(CodingSystem::Namaste, "ज्वर", 1)
        .expect("search namaste");
    assert_eq!(devanagari[0].concept.code.as_str(), "NAMC001");
}

#[test]
fn blank_search_text_finds_nothing() {
    let resolver = resolver();
    for text in ["", "   ", "()", "-- ,"] {
        let hits = resolver
            .search(CodingSystem::SnomedCt, text, 5)
            .expect("search");
        assert!(hits.is_empty(), "{text:?}");
    }
}

#[test]
fn search_reports_bad_breadth_and_missing_index() {
    let resolver = resolver();
    assert_eq!(
        resolver.search(CodingSystem::SnomedCt, "fever", 0),
        Err(ResolveError::InvalidOptions(OptionsError::ZeroK))
    );
    let err = resolver
        .search(CodingSystem::Loinc, "fever", 5)
        .expect_err("no loinc index");
    assert_eq!(err.kind(), "UNAVAILABLE");
}

#[test]
fn lookup_returns_the_stored_concept() {
    let resolver = resolver();
    let concept = resolver
        .lookup(CodingSystem::SnomedCt, " 386661006 ")
        .expect("lookup");
    assert_eq!(concept.display, "Fever (disorder)");
    assert!(concept.synonyms.contains("Pyrexia"));

    assert_eq!(
        resolver.lookup(CodingSystem::Namaste, "NAMC404"),
        Err(ResolveError::NotFound {
            system: CodingSystem::Namaste,
            code: "NAMC404".to_string(),
        })
    );
}
