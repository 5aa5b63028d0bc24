use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CodingSystem, ConceptCode};

/// Language tag used when a concept does not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// One entry within a coding system.
///
/// Concepts are immutable once loaded; only the ingestion path outside this
/// workspace creates or updates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub system: CodingSystem,
    pub code: ConceptCode,
    pub display: String,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
    /// BCP-47 style language tag (e.g. "en", "sa", "sa-Latn").
    #[serde(default = "default_language")]
    pub language: String,
    /// Parent code for hierarchical systems.
    #[serde(default)]
    pub parent: Option<ConceptCode>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Concept {
    pub fn new(system: CodingSystem, code: ConceptCode, display: impl Into<String>) -> Self {
        Self {
            system,
            code,
            display: display.into(),
            synonyms: BTreeSet::new(),
            language: default_language(),
            parent: None,
        }
    }

    /// Add a synonym. Blank synonyms and exact duplicates of the display are ignored.
    #[must_use]
    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        let synonym = synonym.into();
        let trimmed = synonym.trim();
        if !trimmed.is_empty() && trimmed != self.display.trim() {
            self.synonyms.insert(trimmed.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_synonyms<I, S>(self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        synonyms
            .into_iter()
            .fold(self, |concept, synonym| concept.with_synonym(synonym))
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ConceptCode) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Display text followed by synonyms in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }

    pub fn to_ref(&self) -> ConceptRef {
        ConceptRef {
            system: self.system,
            code: self.code.clone(),
            display: self.display.clone(),
        }
    }
}

/// Lightweight reference to a concept, carried by mapping candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptRef {
    pub system: CodingSystem,
    pub code: ConceptCode,
    pub display: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: &str) -> ConceptCode {
        ConceptCode::new(value).unwrap()
    }

    #[test]
    fn terms_start_with_display() {
        let concept = Concept::new(CodingSystem::SnomedCt, code("386661006"), "Fever")
            .with_synonyms(["Pyrexia", "Febrile"]);
        let terms: Vec<&str> = concept.terms().collect();
        assert_eq!(terms, vec!["Fever", "Febrile", "Pyrexia"]);
    }

    #[test]
    fn blank_and_display_synonyms_are_ignored() {
        let concept = Concept::new(CodingSystem::Namaste, code("NAMC001"), "jvara")
            .with_synonym("  ")
            .with_synonym("jvara")
            .with_synonym(" fever ");
        assert_eq!(concept.synonyms.len(), 1);
        assert!(concept.synonyms.contains("fever"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"system":"NAMASTE","code":"NAMC001","display":"jvara"}"#;
        let concept: Concept = serde_json::from_str(json).unwrap();
        assert_eq!(concept.language, DEFAULT_LANGUAGE);
        assert!(concept.synonyms.is_empty());
        assert!(concept.parent.is_none());
    }
}
