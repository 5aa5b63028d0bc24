//! Mapping candidate and result types.
//!
//! Candidates are produced per request and never persisted by the resolver.
//! A [`MappingResult`] is owned by the caller once returned.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CodingSystem, Concept, ConceptRef};

/// Classification of a mapping attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Top confidence is at or above the threshold.
    Matched,
    /// Candidates exist but all fall below the threshold.
    Partial,
    /// No candidate survived retrieval.
    NotFound,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::Partial => "PARTIAL",
            Self::NotFound => "NOT_FOUND",
        }
    }

    /// Classify a result from its top confidence.
    pub fn classify(top_confidence: Option<f32>, threshold: f32) -> Self {
        match top_confidence {
            None => Self::NotFound,
            Some(confidence) if confidence >= threshold => Self::Matched,
            Some(_) => Self::Partial,
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic relation implied by a candidate's confidence.
///
/// Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingRelation {
    /// Confidence at or below 0.6.
    Broader,
    /// Confidence in (0.6, 0.7].
    Narrower,
    /// Confidence in (0.7, 0.8].
    Related,
    /// Confidence in (0.8, 0.9].
    Equivalent,
    /// Confidence above 0.9.
    Exact,
}

impl MappingRelation {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.9 {
            Self::Exact
        } else if confidence > 0.8 {
            Self::Equivalent
        } else if confidence > 0.7 {
            Self::Related
        } else if confidence > 0.6 {
            Self::Narrower
        } else {
            Self::Broader
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broader => "BROADER",
            Self::Narrower => "NARROWER",
            Self::Related => "RELATED",
            Self::Equivalent => "EQUIVALENT",
            Self::Exact => "EXACT",
        }
    }
}

impl fmt::Display for MappingRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component contributing to a candidate's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// Component name (e.g., "Semantic similarity").
    pub name: String,
    /// Component value. Informational components do not add to confidence.
    pub value: f32,
    /// Whether the value is part of the confidence sum.
    pub contributes: bool,
    /// Human-readable description.
    pub description: String,
}

/// Breakdown of a candidate score for explainability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: Vec<ScoreComponent>,
}

impl ScoreBreakdown {
    pub fn push(
        &mut self,
        name: impl Into<String>,
        value: f32,
        contributes: bool,
        description: impl Into<String>,
    ) {
        self.components.push(ScoreComponent {
            name: name.into(),
            value,
            contributes,
            description: description.into(),
        });
    }

    /// Human-readable explanation of the score.
    pub fn explain(&self) -> String {
        self.components
            .iter()
            .map(|c| format!("{}: {:.0}%", c.name, c.value * 100.0))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Sum of the contributing components.
    pub fn contributing_total(&self) -> f32 {
        self.components
            .iter()
            .filter(|c| c.contributes)
            .map(|c| c.value)
            .sum()
    }
}

/// A ranked translation from a source concept to a target concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCandidate {
    pub source: ConceptRef,
    pub target: ConceptRef,
    /// Best cosine similarity across source strings, in [0, 1].
    pub similarity: f32,
    /// Bonus applied for an exact normalized term match.
    pub lexical_bonus: f32,
    /// Final confidence, in [0, 1].
    pub confidence: f32,
    /// 1-based rank within the result.
    pub rank: usize,
    pub relation: MappingRelation,
    pub breakdown: ScoreBreakdown,
    pub rationale: String,
}

/// A concept retrieved by free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub concept: ConceptRef,
    /// Best cosine similarity between the query and a term of the concept.
    pub similarity: f32,
    /// 1-based rank within the search.
    pub rank: usize,
}

/// Outcome of resolving one source concept against one target system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub source: Concept,
    pub target_system: CodingSystem,
    /// Highest confidence first.
    pub candidates: Vec<MappingCandidate>,
    pub status: ResolutionStatus,
    /// Version of the target index snapshot the result was computed against.
    pub index_version: u64,
}

impl MappingResult {
    pub fn top(&self) -> Option<&MappingCandidate> {
        self.candidates.first()
    }

    pub fn top_confidence(&self) -> Option<f32> {
        self.top().map(|c| c.confidence)
    }

    /// Returns true if confidences are non-increasing by rank.
    pub fn is_ranked(&self) -> bool {
        self.candidates
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence)
    }
}
