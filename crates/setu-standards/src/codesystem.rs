//! FHIR R4 `CodeSystem` loader.

use std::path::Path;

use serde::Deserialize;
use setu_model::{CodingSystem, Concept, ConceptCode, DEFAULT_LANGUAGE};
use tracing::debug;

use crate::StandardsError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeSystemResource {
    resource_type: Option<String>,
    url: Option<String>,
    language: Option<String>,
    #[serde(default)]
    concept: Vec<FhirConcept>,
}

#[derive(Debug, Deserialize)]
struct FhirConcept {
    code: Option<String>,
    display: Option<String>,
    #[serde(default)]
    designation: Vec<Designation>,
    /// Non-standard synonym list emitted by some ingestion scripts.
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    concept: Vec<FhirConcept>,
}

#[derive(Debug, Deserialize)]
struct Designation {
    language: Option<String>,
    value: Option<String>,
}

/// Load concepts from a FHIR `CodeSystem` JSON file.
///
/// The coding system is `system` when given, otherwise it is derived from the
/// resource `url`. Nested concepts are flattened depth-first and record the
/// enclosing code as their parent. Concepts missing a code or display are
/// skipped.
pub fn load_codesystem_json(
    path: &Path,
    system: Option<CodingSystem>,
) -> Result<Vec<Concept>, StandardsError> {
    let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    parse_codesystem(path, &text, system)
}

pub(crate) fn parse_codesystem(
    path: &Path,
    text: &str,
    system: Option<CodingSystem>,
) -> Result<Vec<Concept>, StandardsError> {
    let resource: CodeSystemResource =
        serde_json::from_str(text).map_err(|source| StandardsError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(kind) = resource.resource_type.as_deref()
        && kind != "CodeSystem"
    {
        return Err(StandardsError::InvalidResource {
            path: path.to_path_buf(),
            message: format!("resourceType is {kind:?}, expected \"CodeSystem\""),
        });
    }

    let system = match system {
        Some(system) => system,
        None => {
            let url = resource.url.clone().unwrap_or_default();
            CodingSystem::from_uri(&url).ok_or_else(|| StandardsError::UnknownSystem {
                path: path.to_path_buf(),
                value: url,
            })?
        }
    };

    let language = resource
        .language
        .clone()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let mut concepts = Vec::new();
    let mut skipped = 0usize;
    flatten(
        &resource.concept,
        None,
        system,
        &language,
        &mut concepts,
        &mut skipped,
    );
    debug!(
        path = %path.display(),
        system = %system,
        loaded = concepts.len(),
        skipped,
        "loaded CodeSystem"
    );
    Ok(concepts)
}

fn flatten(
    nodes: &[FhirConcept],
    parent: Option<&ConceptCode>,
    system: CodingSystem,
    language: &str,
    out: &mut Vec<Concept>,
    skipped: &mut usize,
) {
    for node in nodes {
        let code = node.code.as_deref().and_then(|c| ConceptCode::new(c).ok());
        let display = node
            .display
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let Some(code) = code else {
            *skipped += 1;
            flatten(&node.concept, parent, system, language, out, skipped);
            continue;
        };

        if let Some(display) = display {
            let node_language = node
                .designation
                .iter()
                .find_map(|d| d.language.as_deref().filter(|l| !l.trim().is_empty()))
                .unwrap_or(language);
            let mut concept = Concept::new(system, code.clone(), display)
                .with_language(node_language)
                .with_synonyms(node.designation.iter().filter_map(|d| d.value.clone()))
                .with_synonyms(node.synonyms.iter().cloned());
            if let Some(parent) = parent {
                concept = concept.with_parent(parent.clone());
            }
            out.push(concept);
        } else {
            *skipped += 1;
        }

        flatten(&node.concept, Some(&code), system, language, out, skipped);
    }
}
