use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CodingSystem, ConceptRef, MappingResult, ResolutionStatus};

/// Analytics record emitted after every successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub source: ConceptRef,
    pub target_system: CodingSystem,
    pub result_status: ResolutionStatus,
    pub top_confidence: Option<f32>,
}

impl AuditEvent {
    pub fn from_result(result: &MappingResult) -> Self {
        Self {
            timestamp: Utc::now(),
            source: result.source.to_ref(),
            target_system: result.target_system,
            result_status: result.status,
            top_confidence: result.top_confidence(),
        }
    }
}
