//! Supported coding systems.
//!
//! The set of terminologies is closed: adding a system means adding a variant
//! here and letting the compiler point at every match that needs updating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// A terminology namespace that concept codes belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum CodingSystem {
    /// National AYUSH Morbidity & Standardized Terminologies Electronic.
    /// Traditional-medicine terms (Ayurveda, Siddha, Unani).
    Namaste,
    /// ICD-11 Chapter 26, Traditional Medicine Module 2.
    Icd11Tm2,
    /// ICD-11 Mortality and Morbidity Statistics (biomedicine chapters).
    Icd11Biomedicine,
    /// SNOMED CT clinical terminology.
    SnomedCt,
    /// LOINC laboratory and clinical observations.
    Loinc,
}

impl CodingSystem {
    /// All systems in a stable order.
    pub const ALL: [CodingSystem; 5] = [
        CodingSystem::Namaste,
        CodingSystem::Icd11Tm2,
        CodingSystem::Icd11Biomedicine,
        CodingSystem::SnomedCt,
        CodingSystem::Loinc,
    ];

    /// Number of supported systems.
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical identifier used in requests, files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodingSystem::Namaste => "NAMASTE",
            CodingSystem::Icd11Tm2 => "ICD-11-TM2",
            CodingSystem::Icd11Biomedicine => "ICD-11-BIO",
            CodingSystem::SnomedCt => "SNOMED-CT",
            CodingSystem::Loinc => "LOINC",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CodingSystem::Namaste => "NAMASTE (AYUSH traditional medicine)",
            CodingSystem::Icd11Tm2 => "ICD-11 Traditional Medicine Module 2",
            CodingSystem::Icd11Biomedicine => "ICD-11 Biomedicine (MMS)",
            CodingSystem::SnomedCt => "SNOMED CT",
            CodingSystem::Loinc => "LOINC",
        }
    }

    /// Canonical FHIR `CodeSystem.url`.
    pub fn uri(&self) -> &'static str {
        match self {
            CodingSystem::Namaste => "http://ayush.gov.in/fhir/CodeSystem/NAMASTE",
            CodingSystem::Icd11Tm2 => "http://id.who.int/icd/release/11/tm2",
            CodingSystem::Icd11Biomedicine => "http://id.who.int/icd/release/11/mms",
            CodingSystem::SnomedCt => "http://snomed.info/sct",
            CodingSystem::Loinc => "http://loinc.org",
        }
    }

    /// Dense index into per-system tables, in `ALL` order.
    pub fn index(&self) -> usize {
        match self {
            CodingSystem::Namaste => 0,
            CodingSystem::Icd11Tm2 => 1,
            CodingSystem::Icd11Biomedicine => 2,
            CodingSystem::SnomedCt => 3,
            CodingSystem::Loinc => 4,
        }
    }

    /// Resolve a FHIR `CodeSystem.url` to a system.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let uri = uri.trim().trim_end_matches('/');
        Self::ALL
            .into_iter()
            .find(|system| system.uri().eq_ignore_ascii_case(uri))
    }
}

impl fmt::Display for CodingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CodingSystem> for &'static str {
    fn from(system: CodingSystem) -> Self {
        system.as_str()
    }
}

impl TryFrom<String> for CodingSystem {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for CodingSystem {
    type Err = ModelError;

    /// Parse a system identifier (case-insensitive, common aliases and FHIR URIs).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(system) = Self::from_uri(s) {
            return Ok(system);
        }
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "NAMASTE" | "AYUSH" => Ok(CodingSystem::Namaste),
            "ICD11TM2" | "TM2" | "ICDTM2" => Ok(CodingSystem::Icd11Tm2),
            "ICD11BIO" | "ICD11BIOMEDICINE" | "ICD11MMS" | "MMS" | "ICD11" => {
                Ok(CodingSystem::Icd11Biomedicine)
            }
            "SNOMEDCT" | "SNOMED" | "SCT" => Ok(CodingSystem::SnomedCt),
            "LOINC" => Ok(CodingSystem::Loinc),
            _ => Err(ModelError::UnknownSystem(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_identifiers() {
        for system in CodingSystem::ALL {
            assert_eq!(system.as_str().parse::<CodingSystem>().unwrap(), system);
        }
    }

    #[test]
    fn parses_aliases_and_uris() {
        assert_eq!("snomed".parse::<CodingSystem>().unwrap(), CodingSystem::SnomedCt);
        assert_eq!("icd11-tm2".parse::<CodingSystem>().unwrap(), CodingSystem::Icd11Tm2);
        assert_eq!(
            "ICD-11-Biomedicine".parse::<CodingSystem>().unwrap(),
            CodingSystem::Icd11Biomedicine
        );
        assert_eq!(
            "http://snomed.info/sct/".parse::<CodingSystem>().unwrap(),
            CodingSystem::SnomedCt
        );
    }

    #[test]
    fn rejects_unknown_system() {
        let err = "WHO-Ayurveda".parse::<CodingSystem>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownSystem(_)));
    }

    #[test]
    fn index_follows_all_order() {
        for (position, system) in CodingSystem::ALL.iter().enumerate() {
            assert_eq!(system.index(), position);
        }
    }
}
