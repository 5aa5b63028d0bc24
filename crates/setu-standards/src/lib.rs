//! Loading the canonical concept store.

#![deny(unsafe_code)]

pub mod codesystem;
pub mod concept_csv;
pub mod error;
pub mod loaders;

pub use codesystem::load_codesystem_json;
pub use concept_csv::{SYNONYM_SEPARATOR, load_concepts_csv};
pub use error::StandardsError;
pub use loaders::{ConceptSource, load_concept_files};
