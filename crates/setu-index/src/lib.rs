//! Embedding index for terminology mapping.
//!
//! Concepts are embedded per normalized term and grouped into immutable
//! [`SystemSnapshot`]s, one per coding system. [`EmbeddingIndex`] publishes
//! snapshots with an atomic pointer swap so rebuilds never block queries.

#![deny(unsafe_code)]

mod embedder;
mod error;
mod index;
mod snapshot;

pub use embedder::{DEFAULT_DIMENSION, Embedder, HashingEmbedder, cosine_similarity};
pub use error::IndexError;
pub use index::{EmbeddingIndex, ScoredConcept};
pub use snapshot::{IndexedConcept, Neighbor, SystemSnapshot};
