//! Canonical form of clinical terms.

use tracing::trace;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::hint::LanguageHint;
use crate::transliterate::{contains_devanagari, transliterate};
use crate::variants::{VariantTable, fold_romanized};

/// Lexical normalizer shared by index builds and resolution.
///
/// Normalization is deterministic and total: text in scripts the normalizer
/// does not know is case-folded and otherwise passed through.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    variants: VariantTable,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer that also maps the table's variants onto their canonical
    /// spellings. Canonical spellings are normalized like any other text.
    pub fn with_variants(variants: VariantTable) -> Self {
        let plain = Self::new();
        let variants = variants.resolved(|text| plain.normalize(text, LanguageHint::Auto));
        Self { variants }
    }

    pub fn variants(&self) -> &VariantTable {
        &self.variants
    }

    /// Canonical form: canonical tokens joined by single spaces.
    pub fn normalize(&self, text: &str, hint: LanguageHint) -> String {
        self.tokens(text, hint).join(" ")
    }

    /// Canonical token sequence for `text`.
    pub fn tokens(&self, text: &str, hint: LanguageHint) -> Vec<String> {
        let composed: String = text.nfc().collect();
        let had_devanagari = contains_devanagari(&composed);
        let romanized = if had_devanagari {
            transliterate(&composed)
        } else {
            composed
        };

        let lowered = romanized.to_lowercase();
        let untagged = strip_trailing_tag(&lowered);
        let spaced = punctuation_to_spaces(untagged);
        let plain = strip_latin_marks(&spaced);

        let fold = had_devanagari || hint.folds_romanization();
        let mut tokens: Vec<String> = Vec::new();
        for token in plain.split_whitespace() {
            let token = if fold {
                fold_romanized(token)
            } else {
                token.to_string()
            };
            match self.variants.get(&token) {
                Some(canonical) => tokens.extend(canonical.split(' ').map(str::to_string)),
                None => tokens.push(token),
            }
        }

        trace!(input = text, %hint, tokens = ?tokens, "normalized");
        tokens
    }
}

/// Terminology hierarchy tags removed from the end of a term.
///
/// Other parentheticals such as `(25-OH)` distinguish concepts and are kept.
const HIERARCHY_TAGS: &[&str] = &[
    "attribute",
    "body structure",
    "cell",
    "cell structure",
    "clinical drug",
    "core metadata concept",
    "disorder",
    "environment",
    "environment / location",
    "ethnic group",
    "event",
    "finding",
    "geographic location",
    "inactive concept",
    "life style",
    "link assertion",
    "medicinal product",
    "medicinal product form",
    "morphologic abnormality",
    "namespace concept",
    "navigational concept",
    "observable entity",
    "occupation",
    "organism",
    "person",
    "physical force",
    "physical object",
    "procedure",
    "product",
    "qualifier value",
    "racial group",
    "record artifact",
    "regime/therapy",
    "religion/philosophy",
    "situation",
    "social concept",
    "special concept",
    "specimen",
    "staging scale",
    "substance",
    "tumor staging",
];

/// Remove one trailing hierarchy tag such as `(disorder)`.
///
/// The tag is kept when nothing precedes it.
fn strip_trailing_tag(text: &str) -> &str {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix(')') else {
        return trimmed;
    };
    let Some(open) = inner.rfind('(') else {
        return trimmed;
    };
    let (head, tag) = (&inner[..open], inner[open + 1..].trim());
    if head.trim().is_empty() || !HIERARCHY_TAGS.contains(&tag) {
        return trimmed;
    }
    head.trim_end()
}

fn punctuation_to_spaces(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| {
            if c.is_alphanumeric() || is_combining_mark(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn is_latin_base(c: char) -> bool {
    c.is_ascii()
        || ('\u{00C0}'..='\u{024F}').contains(&c)
        || ('\u{1E00}'..='\u{1EFF}').contains(&c)
}

/// Drop combining marks attached to Latin letters; other scripts keep theirs.
fn strip_latin_marks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut base_is_latin = true;
    for c in text.nfd() {
        if is_combining_mark(c) {
            if !base_is_latin {
                out.push(c);
            }
        } else {
            base_is_latin = is_latin_base(c);
            out.push(c);
        }
    }
    out.nfc().collect()
}

/// Normalize with an empty variant table.
pub fn normalize(text: &str, hint: LanguageHint) -> String {
    Normalizer::new().normalize(text, hint)
}
