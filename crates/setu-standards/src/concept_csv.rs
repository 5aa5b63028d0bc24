//! Canonical concept CSV loader.
//!
//! Headers are matched case-insensitively and accept the column names used by
//! the AYUSH terminology spreadsheets (`namc_code`, `namc_term`, ...).

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use setu_model::{CodingSystem, Concept, ConceptCode};
use tracing::debug;

use crate::StandardsError;

/// Separator between synonyms in the `synonyms` column.
pub const SYNONYM_SEPARATOR: char = '|';

const CODE_ALIASES: &[&str] = &["code", "codes", "ayushcode", "termcode", "namc_code", "numc_code"];
const DISPLAY_ALIASES: &[&str] = &[
    "display",
    "term",
    "name",
    "label",
    "namc_term",
    "namc_term_diacritical",
    "numc_term",
];
const SYNONYM_ALIASES: &[&str] = &["synonyms", "synonym"];
const LANGUAGE_ALIASES: &[&str] = &["language", "lang"];
const PARENT_ALIASES: &[&str] = &["parent", "parent_code"];

struct Columns {
    code: usize,
    display: usize,
    synonyms: Option<usize>,
    language: Option<usize>,
    parent: Option<usize>,
}

impl Columns {
    fn resolve(path: &Path, headers: &StringRecord) -> Result<Self, StandardsError> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|header| {
                let header = header.trim_matches('\u{feff}').trim().to_ascii_lowercase();
                aliases.contains(&header.as_str())
            })
        };
        let required = |aliases: &[&str], name: &str| {
            find(aliases)
                .ok_or_else(|| StandardsError::csv(path, format!("missing required column {name:?}")))
        };
        Ok(Self {
            code: required(CODE_ALIASES, "code")?,
            display: required(DISPLAY_ALIASES, "display")?,
            synonyms: find(SYNONYM_ALIASES),
            language: find(LANGUAGE_ALIASES),
            parent: find(PARENT_ALIASES),
        })
    }
}

fn field<'a>(record: &'a StringRecord, index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Load concepts of `system` from a canonical CSV file.
///
/// Rows without a code or display are skipped.
pub fn load_concepts_csv(path: &Path, system: CodingSystem) -> Result<Vec<Concept>, StandardsError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => StandardsError::io(path, source),
            other => StandardsError::csv(path, format!("{other:?}")),
        })?;

    let headers = reader
        .headers()
        .map_err(|e| StandardsError::csv(path, e.to_string()))?
        .clone();
    let columns = Columns::resolve(path, &headers)?;

    let mut concepts = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| StandardsError::csv(path, e.to_string()))?;
        let code = field(&record, Some(columns.code)).and_then(|c| ConceptCode::new(c).ok());
        let display = field(&record, Some(columns.display));
        let (Some(code), Some(display)) = (code, display) else {
            skipped += 1;
            continue;
        };

        let mut concept = Concept::new(system, code, display);
        if let Some(synonyms) = field(&record, columns.synonyms) {
            concept = concept.with_synonyms(synonyms.split(SYNONYM_SEPARATOR));
        }
        if let Some(language) = field(&record, columns.language) {
            concept = concept.with_language(language);
        }
        if let Some(parent) = field(&record, columns.parent).and_then(|p| ConceptCode::new(p).ok())
        {
            concept = concept.with_parent(parent);
        }
        concepts.push(concept);
    }

    debug!(
        path = %path.display(),
        system = %system,
        loaded = concepts.len(),
        skipped,
        "loaded concept CSV"
    );
    Ok(concepts)
}
