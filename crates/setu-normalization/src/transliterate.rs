//! Devanagari to ASCII romanization.
//!
//! The output is a plain-ASCII scheme close to common clinical usage
//! ("jvara", "kasa", "amlapitta"): long vowels are doubled, aspirates take an
//! `h`, retroflex and dental series collapse onto the same letters. Variant
//! folding later reduces doubled vowels so that romanized and native spellings
//! meet on one token.

const VIRAMA: char = '\u{094D}';
const NUKTA: char = '\u{093C}';

/// Returns true if the text contains any Devanagari code point.
pub fn contains_devanagari(text: &str) -> bool {
    text.chars().any(is_devanagari)
}

pub fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Romanize Devanagari runs; all other characters are copied through.
///
/// A consonant carries the inherent `a` unless followed by a vowel sign or a
/// virama. Unassigned or Vedic code points inside the block are dropped.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if !is_devanagari(c) {
            out.push(c);
            continue;
        }

        if let Some(consonant) = consonant(c) {
            out.push_str(consonant);
            if chars.peek() == Some(&NUKTA) {
                chars.next();
            }
            let next = chars.peek().copied();
            if next == Some(VIRAMA) {
                chars.next();
            } else if let Some(sign) = next.and_then(vowel_sign) {
                chars.next();
                out.push_str(sign);
            } else {
                out.push('a');
            }
            continue;
        }

        if let Some(roman) = vowel(c).or_else(|| vowel_sign(c)).or_else(|| other(c)) {
            out.push_str(roman);
        }
    }

    out
}

fn consonant(c: char) -> Option<&'static str> {
    let roman = match c {
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "n",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "n",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' | 'ऩ' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' | 'ऱ' => "r",
        'ल' => "l",
        'ळ' | 'ऴ' => "l",
        'व' => "v",
        'श' => "sh",
        'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        // Precomposed nukta forms.
        '\u{0958}' => "q",
        '\u{0959}' => "kh",
        '\u{095A}' => "g",
        '\u{095B}' => "z",
        '\u{095C}' => "r",
        '\u{095D}' => "rh",
        '\u{095E}' => "f",
        '\u{095F}' => "y",
        _ => return None,
    };
    Some(roman)
}

fn vowel(c: char) -> Option<&'static str> {
    let roman = match c {
        'अ' => "a",
        'आ' => "aa",
        'इ' => "i",
        'ई' => "ii",
        'उ' => "u",
        'ऊ' => "uu",
        'ऋ' => "ri",
        'ॠ' => "rii",
        'ऌ' => "li",
        'ए' | 'ऎ' => "e",
        'ऐ' => "ai",
        'ओ' | 'ऒ' => "o",
        'औ' => "au",
        'ऍ' => "e",
        'ऑ' => "o",
        _ => return None,
    };
    Some(roman)
}

fn vowel_sign(c: char) -> Option<&'static str> {
    let roman = match c {
        'ा' => "aa",
        'ि' => "i",
        'ी' => "ii",
        'ु' => "u",
        'ू' => "uu",
        'ृ' => "ri",
        'ॄ' => "rii",
        'ॢ' => "li",
        'े' | 'ॆ' => "e",
        'ै' => "ai",
        'ो' | 'ॊ' => "o",
        'ौ' => "au",
        'ॅ' => "e",
        'ॉ' => "o",
        _ => return None,
    };
    Some(roman)
}

fn other(c: char) -> Option<&'static str> {
    let roman = match c {
        'ं' => "m",
        'ँ' => "n",
        'ः' => "h",
        '।' | '॥' => " ",
        '०' => "0",
        '१' => "1",
        '२' => "2",
        '३' => "3",
        '४' => "4",
        '५' => "5",
        '६' => "6",
        '७' => "7",
        '८' => "8",
        '९' => "9",
        _ => return None,
    };
    Some(roman)
}
