//! Domain types for terminology cross-mapping.

#![deny(unsafe_code)]

pub mod audit;
pub mod concept;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod options;
pub mod repository;
pub mod system;

pub use audit::AuditEvent;
pub use concept::{Concept, ConceptRef, DEFAULT_LANGUAGE};
pub use error::{ModelError, OptionsError, RepositoryError};
pub use ids::ConceptCode;
pub use mapping::{
    MappingCandidate, MappingRelation, MappingResult, ResolutionStatus, ScoreBreakdown,
    ScoreComponent, SearchHit,
};
pub use options::{
    DEFAULT_K, DEFAULT_LEXICAL_BONUS, DEFAULT_MIN_SIMILARITY, DEFAULT_THRESHOLD, ResolveOptions,
};
pub use repository::{ConceptRepository, InMemoryConceptRepository, InMemoryRepositoryBuilder};
pub use system::CodingSystem;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_event_mirrors_result() {
        let source = Concept::new(
            CodingSystem::Namaste,
            ConceptCode::new("NAMC001").unwrap(),
            "jvara",
        );
        let result = MappingResult {
            source,
            target_system: CodingSystem::SnomedCt,
            candidates: vec![],
            status: ResolutionStatus::NotFound,
            index_version: 3,
        };
        let event = AuditEvent::from_result(&result);
        assert_eq!(event.source.code.as_str(), "NAMC001");
        assert_eq!(event.target_system, CodingSystem::SnomedCt);
        assert_eq!(event.result_status, ResolutionStatus::NotFound);
        assert!(event.top_confidence.is_none());
    }
}
