//! Building a repository from several concept files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use setu_model::{CodingSystem, InMemoryConceptRepository};
use tracing::{info, warn};

use crate::{StandardsError, load_codesystem_json, load_concepts_csv};

/// A concept file and the coding system its concepts belong to.
///
/// Parsed from `SYSTEM=PATH` or a bare `PATH`; a bare path is only valid for
/// a CodeSystem JSON whose `url` names the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptSource {
    pub system: Option<CodingSystem>,
    pub path: PathBuf,
}

impl ConceptSource {
    pub fn new(system: CodingSystem, path: impl Into<PathBuf>) -> Self {
        Self {
            system: Some(system),
            path: path.into(),
        }
    }
}

impl FromStr for ConceptSource {
    type Err = StandardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((system, path)) => {
                let path = PathBuf::from(path.trim());
                let system = system
                    .parse::<CodingSystem>()
                    .map_err(|_| StandardsError::UnknownSystem {
                        path: path.clone(),
                        value: system.trim().to_string(),
                    })?;
                Ok(Self {
                    system: Some(system),
                    path,
                })
            }
            None => Ok(Self {
                system: None,
                path: PathBuf::from(s.trim()),
            }),
        }
    }
}

impl fmt::Display for ConceptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            Some(system) => write!(f, "{system}={}", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Load every source into one repository.
///
/// Sources are read in order; when a code appears twice within a system the
/// first occurrence is kept.
pub fn load_concept_files(
    sources: &[ConceptSource],
) -> Result<InMemoryConceptRepository, StandardsError> {
    let mut builder = InMemoryConceptRepository::builder();
    for source in sources {
        let concepts = match extension(&source.path).as_str() {
            "json" => load_codesystem_json(&source.path, source.system)?,
            "csv" => {
                let system = source.system.ok_or_else(|| StandardsError::UnknownSystem {
                    path: source.path.clone(),
                    value: String::new(),
                })?;
                load_concepts_csv(&source.path, system)?
            }
            _ => {
                return Err(StandardsError::UnsupportedFormat {
                    path: source.path.clone(),
                });
            }
        };
        builder.extend(concepts);
    }
    if builder.duplicates() > 0 {
        warn!(duplicates = builder.duplicates(), "duplicate concept codes skipped");
    }
    let repository = builder.build();
    info!(
        files = sources.len(),
        concepts = repository.total(),
        "concept repository loaded"
    );
    Ok(repository)
}
