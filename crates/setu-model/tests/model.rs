use setu_model::{
    CodingSystem, Concept, ConceptCode, ConceptRepository, InMemoryConceptRepository,
    MappingRelation, ModelError, ResolutionStatus, ResolveOptions,
};

fn fever() -> Concept {
    Concept::new(
        CodingSystem::SnomedCt,
        ConceptCode::new("386661006").expect("valid code"),
        "Fever (disorder)",
    )
    .with_synonyms(["Pyrexia", "Febrile"])
    .with_parent(ConceptCode::new("404684003").expect("valid code"))
}

#[test]
fn concept_round_trips_through_json() {
    let concept = fever();
    let json = serde_json::to_string(&concept).expect("serialize concept");
    assert!(json.contains(r#""system":"SNOMED-CT""#));
    let back: Concept = serde_json::from_str(&json).expect("deserialize concept");
    assert_eq!(back, concept);
}

#[test]
fn blank_code_is_rejected() {
    let err = ConceptCode::new("   ").expect_err("blank code");
    assert!(matches!(err, ModelError::InvalidCode(_)));

    let json = r#"{"system":"LOINC","code":"  ","display":"x"}"#;
    assert!(serde_json::from_str::<Concept>(json).is_err());
}

#[test]
fn unknown_system_fails_deserialization() {
    let json = r#"{"system":"READ-V2","code":"X","display":"x"}"#;
    assert!(serde_json::from_str::<Concept>(json).is_err());
}

#[test]
fn status_and_relation_serialize_as_identifiers() {
    assert_eq!(
        serde_json::to_string(&ResolutionStatus::NotFound).expect("serialize status"),
        r#""NOT_FOUND""#
    );
    assert_eq!(
        serde_json::to_string(&MappingRelation::Equivalent).expect("serialize relation"),
        r#""EQUIVALENT""#
    );
}

#[test]
fn options_fill_missing_fields_with_defaults() {
    let options: ResolveOptions =
        serde_json::from_str(r#"{"threshold":0.8}"#).expect("deserialize options");
    assert_eq!(options.k, 10);
    assert!((options.threshold - 0.8).abs() < f32::EPSILON);
    assert!(options.validate().is_ok());
}

#[test]
fn repository_is_usable_through_trait_object() {
    let repo: Box<dyn ConceptRepository> =
        Box::new(InMemoryConceptRepository::from_concepts([fever()]));
    let found = repo
        .get_concept(CodingSystem::SnomedCt, "386661006")
        .expect("lookup")
        .expect("concept present");
    assert_eq!(found.synonyms.len(), 2);
    assert_eq!(
        repo.list_concepts(CodingSystem::SnomedCt).expect("list").len(),
        1
    );
}
