//! Aggregate statistics over mapping results.

use std::collections::BTreeMap;

use serde::Serialize;
use setu_model::{MappingRelation, MappingResult, ResolutionStatus};

/// Number of confidence buckets, each 10% wide.
pub const CONFIDENCE_BUCKETS: usize = 10;

/// Distribution of outcomes and top confidences over a set of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingStatistics {
    pub total: usize,
    pub matched: usize,
    pub partial: usize,
    pub not_found: usize,
    /// Relation of each result's top candidate.
    pub relations: BTreeMap<MappingRelation, usize>,
    /// Top-confidence counts, bucket `i` covering `[i/10, (i+1)/10)`; 1.0 lands in the last.
    pub confidence_buckets: [usize; CONFIDENCE_BUCKETS],
    pub min_confidence: Option<f32>,
    pub max_confidence: Option<f32>,
    pub mean_confidence: Option<f32>,
}

impl MappingStatistics {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a MappingResult>) -> Self {
        let mut stats = Self::default();
        let mut sum = 0.0f64;
        let mut scored = 0usize;

        for result in results {
            stats.total += 1;
            match result.status {
                ResolutionStatus::Matched => stats.matched += 1,
                ResolutionStatus::Partial => stats.partial += 1,
                ResolutionStatus::NotFound => stats.not_found += 1,
            }
            let Some(top) = result.top() else {
                continue;
            };
            *stats.relations.entry(top.relation).or_default() += 1;
            stats.confidence_buckets[bucket(top.confidence)] += 1;
            let confidence = top.confidence;
            stats.min_confidence = Some(stats.min_confidence.map_or(confidence, |m| m.min(confidence)));
            stats.max_confidence = Some(stats.max_confidence.map_or(confidence, |m| m.max(confidence)));
            sum += f64::from(top.confidence);
            scored += 1;
        }

        if scored > 0 {
            stats.mean_confidence = Some((sum / scored as f64) as f32);
        }
        stats
    }

    /// Buckets labelled `"0-10%"` through `"90-100%"`.
    pub fn labelled_buckets(&self) -> Vec<(String, usize)> {
        self.confidence_buckets
            .iter()
            .enumerate()
            .map(|(i, count)| (format!("{}-{}%", i * 10, i * 10 + 10), *count))
            .collect()
    }
}

fn bucket(confidence: f32) -> usize {
    let index = (confidence.clamp(0.0, 1.0) * CONFIDENCE_BUCKETS as f32).floor() as usize;
    index.min(CONFIDENCE_BUCKETS - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_the_unit_interval() {
        assert_eq!(bucket(0.0), 0);
        assert_eq!(bucket(0.09), 0);
        assert_eq!(bucket(0.7), 7);
        assert_eq!(bucket(1.0), 9);
    }

    #[test]
    fn empty_input_has_no_confidence_range() {
        let stats = MappingStatistics::from_results(std::iter::empty());
        assert_eq!(stats.total, 0);
        assert!(stats.mean_confidence.is_none());
        assert_eq!(stats.labelled_buckets()[9].0, "90-100%");
    }
}
