//! Cross-system concept mapping.
//!
//! [`MappingResolver`] turns a source concept into ranked candidates of a
//! target coding system; [`BatchOrchestrator`] runs it over many requests.
//! Every successful resolution is offered to an [`AuditSink`].

#![deny(unsafe_code)]

pub mod audit;
pub mod batch;
pub mod config;
pub mod error;
pub mod resolver;
pub mod score;
pub mod stats;

pub use audit::{AuditSink, ChannelAuditSink, NoopAuditSink, TracingAuditSink};
pub use batch::{
    BatchItem, BatchOrchestrator, BatchReport, BatchRequest, BatchSummary, CancellationToken,
};
pub use config::{CONFIG_ENV_VAR, ConfigError, SetuConfig};
pub use error::ResolveError;
pub use resolver::MappingResolver;
pub use score::{CandidateScore, score_candidate};
pub use stats::{CONFIDENCE_BUCKETS, MappingStatistics};
