//! Romanization-variant folding and the configurable variant table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Spelling pairs folded onto one form, applied until nothing changes.
///
/// Covers the common disagreements between romanization schemes: doubled
/// long vowels, `w`/`v`, sibilants and aspirated `ch`.
const FOLDS: &[(&str, &str)] = &[
    ("chh", "ch"),
    ("sh", "s"),
    ("aa", "a"),
    ("ee", "i"),
    ("ii", "i"),
    ("oo", "u"),
    ("uu", "u"),
    ("w", "v"),
];

/// Fold one lowercase token to its canonical romanized spelling.
pub fn fold_romanized(token: &str) -> String {
    let mut current = token.to_string();
    loop {
        let mut next = current.clone();
        for (from, to) in FOLDS {
            if next.contains(from) {
                next = next.replace(from, to);
            }
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Extra token-level variants mapped onto canonical tokens.
///
/// Keys and values are stored lowercase as configured. A key is also
/// registered under its folded spelling so lookups work whether or not
/// folding ran. [`VariantTable::resolved`] brings the values into canonical
/// form before a normalizer uses the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct VariantTable {
    entries: BTreeMap<String, String>,
}

impl VariantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `variant` as another spelling of `canonical`.
    ///
    /// Blank keys or values are ignored.
    pub fn insert(&mut self, variant: &str, canonical: &str) {
        let variant = variant.trim().to_lowercase();
        let canonical = canonical.trim().to_lowercase();
        if variant.is_empty() || canonical.is_empty() || variant == canonical {
            return;
        }
        let folded = fold_romanized(&variant);
        if folded != variant {
            self.entries.insert(folded, canonical.clone());
        }
        self.entries.insert(variant, canonical);
    }

    #[must_use]
    pub fn with(mut self, variant: &str, canonical: &str) -> Self {
        self.insert(variant, canonical);
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// This table with every value passed through `normalize` and then
    /// through the table itself until nothing changes.
    ///
    /// Values in the result contain no word that is a key, so one lookup is
    /// final. Entries that come back to their own key or to nothing are
    /// dropped, as are entries caught in a cycle.
    pub fn resolved(&self, normalize: impl Fn(&str) -> String) -> Self {
        let mut entries = BTreeMap::new();
        for (variant, canonical) in &self.entries {
            match self.resolve(canonical, &normalize) {
                Some(value) if !value.is_empty() && value != *variant => {
                    entries.insert(variant.clone(), value);
                }
                Some(_) => {}
                None => warn!(%variant, %canonical, "ignoring cyclic spelling variant"),
            }
        }
        Self { entries }
    }

    fn resolve(&self, canonical: &str, normalize: &impl Fn(&str) -> String) -> Option<String> {
        let mut value = normalize(canonical);
        for _ in 0..=self.entries.len() {
            let next = value
                .split_whitespace()
                .map(|word| match self.entries.get(word) {
                    Some(target) => normalize(target),
                    None => word.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            if next == value {
                return Some(value);
            }
            value = next;
        }
        None
    }
}

impl From<BTreeMap<String, String>> for VariantTable {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut table = Self::new();
        for (variant, canonical) in &map {
            table.insert(variant, canonical);
        }
        table
    }
}

impl From<VariantTable> for BTreeMap<String, String> {
    fn from(table: VariantTable) -> Self {
        table.entries
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for VariantTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (variant, canonical) in iter {
            table.insert(variant, canonical);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_common_romanization_differences() {
        assert_eq!(fold_romanized("jwara"), "jvara");
        assert_eq!(fold_romanized("kaasa"), "kasa");
        assert_eq!(fold_romanized("shotha"), "sotha");
        assert_eq!(fold_romanized("chhardi"), "chardi");
        assert_eq!(fold_romanized("shoola"), "sula");
        assert_eq!(fold_romanized("fever"), "fever");
    }

    #[test]
    fn folding_reaches_a_fixpoint() {
        assert_eq!(fold_romanized("aaaa"), "a");
        assert_eq!(fold_romanized("eee"), fold_romanized(&fold_romanized("eee")));
    }

    #[test]
    fn table_registers_folded_key() {
        let table = VariantTable::new().with("Jwar", "jvara");
        assert_eq!(table.get("jwar"), Some("jvara"));
        assert_eq!(table.get("jvar"), Some("jvara"));
        assert_eq!(table.get("fever"), None);
    }

    fn fold_words(text: &str) -> String {
        text.split_whitespace()
            .map(fold_romanized)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn resolved_values_are_folded_and_flat() {
        let table = VariantTable::new()
            .with("taap", "shoola")
            .with("sula", "jvara")
            .with("kasa", "kaasa");
        let resolved = table.resolved(fold_words);
        assert_eq!(resolved.get("taap"), Some("jvara"));
        assert_eq!(resolved.get("tap"), Some("jvara"));
        assert_eq!(resolved.get("sula"), Some("jvara"));
        assert_eq!(resolved.get("kasa"), None);
    }

    #[test]
    fn cyclic_variants_are_dropped() {
        let table = VariantTable::new().with("kapha", "vata").with("vata", "kapha");
        assert!(table.resolved(fold_words).is_empty());
    }
}
