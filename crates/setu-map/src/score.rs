//! Candidate scoring and explanation.
//!
//! Confidence is the best semantic similarity plus a fixed bonus when a
//! normalized source term equals a normalized term of the candidate, capped
//! at 1.0. Jaro-Winkler similarity of the closest term pair is reported
//! alongside as an informational signal and does not change the confidence.

use rapidfuzz::distance::jaro_winkler;
use setu_index::IndexedConcept;
use setu_model::{ResolveOptions, ScoreBreakdown};

/// Semantic similarity above which the rationale calls it strong.
const STRONG_SEMANTIC: f32 = 0.8;
/// Jaro-Winkler similarity above which the rationale reports lexical overlap.
const HIGH_LEXICAL: f32 = 0.85;

/// Score of one retrieved concept.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub similarity: f32,
    pub lexical_bonus: f32,
    pub confidence: f32,
    pub breakdown: ScoreBreakdown,
    pub rationale: String,
}

/// Score a candidate against the normalized source terms.
pub fn score_candidate(
    source_terms: &[String],
    candidate: &IndexedConcept,
    similarity: f32,
    options: &ResolveOptions,
) -> CandidateScore {
    let similarity = similarity.clamp(0.0, 1.0);
    let exact = source_terms.iter().any(|term| candidate.has_term(term));
    let lexical_bonus = if exact { options.lexical_bonus } else { 0.0 };
    let confidence = (similarity + lexical_bonus).clamp(0.0, 1.0);
    let lexical = best_jaro_winkler(source_terms, &candidate.terms);

    let mut breakdown = ScoreBreakdown::default();
    breakdown.push(
        "Semantic similarity",
        similarity,
        true,
        "best cosine similarity across source terms",
    );
    if exact {
        breakdown.push(
            "Lexical match",
            lexical_bonus,
            true,
            "normalized source term equals a candidate term",
        );
    }
    breakdown.push(
        "Jaro-Winkler",
        lexical,
        false,
        "closest normalized term pair (informational)",
    );

    CandidateScore {
        similarity,
        lexical_bonus,
        confidence,
        rationale: rationale(similarity, lexical, exact),
        breakdown,
    }
}

fn best_jaro_winkler(source_terms: &[String], candidate_terms: &[String]) -> f32 {
    source_terms
        .iter()
        .flat_map(|source| {
            candidate_terms.iter().map(move |target| {
                jaro_winkler::similarity(source.chars(), target.chars()) as f32
            })
        })
        .fold(0.0, f32::max)
}

fn rationale(similarity: f32, lexical: f32, exact: bool) -> String {
    let mut reasons = Vec::new();
    if similarity > STRONG_SEMANTIC {
        reasons.push("Strong semantic similarity in meaning");
    }
    if lexical > HIGH_LEXICAL {
        reasons.push("High lexical overlap in terminology");
    }
    if exact {
        reasons.push("Direct synonym match found");
    }
    if reasons.is_empty() {
        "General conceptual similarity".to_string()
    } else {
        reasons.join("; ")
    }
}
