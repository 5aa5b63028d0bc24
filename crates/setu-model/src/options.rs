//! Options controlling a single resolution.

use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Default number of nearest concepts retrieved per source string.
pub const DEFAULT_K: usize = 10;
/// Default confidence at or above which a result is `MATCHED`.
pub const DEFAULT_THRESHOLD: f32 = 0.7;
/// Default bonus for an exact normalized term match.
pub const DEFAULT_LEXICAL_BONUS: f32 = 0.15;
/// Default similarity floor below which retrieved concepts are discarded.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.3;

/// Calibration knobs for the mapping resolver.
///
/// The bonus and threshold are calibration choices rather than structural
/// constants, so they are always supplied per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Candidate breadth per source string and in the final result.
    pub k: usize,
    /// MATCHED cutoff.
    pub threshold: f32,
    /// Bonus for an exact normalized term match.
    pub lexical_bonus: f32,
    /// Retrieved concepts below this similarity are not candidates.
    pub min_similarity: f32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            threshold: DEFAULT_THRESHOLD,
            lexical_bonus: DEFAULT_LEXICAL_BONUS,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_lexical_bonus(mut self, bonus: f32) -> Self {
        self.lexical_bonus = bonus;
        self
    }

    #[must_use]
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Check that every knob is in range, reporting the first that is not.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.k == 0 {
            return Err(OptionsError::ZeroK);
        }
        let unit = |value: f32| (0.0..=1.0).contains(&value);
        if !unit(self.threshold) {
            return Err(OptionsError::Threshold(self.threshold));
        }
        if !unit(self.lexical_bonus) {
            return Err(OptionsError::LexicalBonus(self.lexical_bonus));
        }
        if !unit(self.min_similarity) {
            return Err(OptionsError::MinSimilarity(self.min_similarity));
        }
        Ok(())
    }
}
