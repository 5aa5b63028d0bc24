use std::fmt;

/// Language hint passed alongside text to the normalizer.
///
/// The hint only decides whether romanization-variant folding runs on Latin
/// tokens. Text containing Devanagari is always folded after romanization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageHint {
    /// Nothing known about the text; folding runs.
    #[default]
    Auto,
    /// A language written natively in Latin script; folding is skipped.
    Latin,
    /// An Indic language, native or romanized; folding runs.
    Indic,
}

const INDIC_LANGUAGES: &[&str] = &[
    "sa", "hi", "mr", "ne", "bn", "gu", "pa", "or", "as", "ta", "te", "kn", "ml", "ur", "si",
    "kok", "mai", "bho",
];

const LATIN_LANGUAGES: &[&str] = &[
    "en", "fr", "de", "es", "pt", "it", "nl", "la", "sv", "da", "no", "fi", "pl", "cs",
];

impl LanguageHint {
    /// Derive a hint from a BCP-47 style tag such as `en`, `sa` or `sa-Latn`.
    ///
    /// A Devanagari script subtag forces [`LanguageHint::Indic`]; unknown
    /// languages map to [`LanguageHint::Auto`].
    pub fn from_tag(tag: &str) -> Self {
        let mut parts = tag.trim().split(['-', '_']).map(str::to_ascii_lowercase);
        let Some(primary) = parts.next().filter(|p| !p.is_empty()) else {
            return Self::Auto;
        };
        if parts.any(|subtag| subtag == "deva") || INDIC_LANGUAGES.contains(&primary.as_str()) {
            Self::Indic
        } else if LATIN_LANGUAGES.contains(&primary.as_str()) {
            Self::Latin
        } else {
            Self::Auto
        }
    }

    pub fn folds_romanization(&self) -> bool {
        !matches!(self, Self::Latin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Latin => "latin",
            Self::Indic => "indic",
        }
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
