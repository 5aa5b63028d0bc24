//! Lexical normalization for terminology mapping.
//!
//! Every string that takes part in matching (concept displays, synonyms,
//! free-text queries) passes through [`Normalizer`] so that case,
//! diacritics, script and romanization differences collapse onto one
//! canonical token sequence.

#![deny(unsafe_code)]

mod hint;
mod normalizer;
mod transliterate;
mod variants;

pub use hint::LanguageHint;
pub use normalizer::{Normalizer, normalize};
pub use transliterate::{contains_devanagari, transliterate};
pub use variants::{VariantTable, fold_romanized};
