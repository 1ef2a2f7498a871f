//! Text cleanup and casing predicates shared by line reconstruction, heading
//! classification and section extraction.

use unicode_normalization::UnicodeNormalization;

/// Appended to truncated text when no sentence end follows the word budget.
pub const TRUNCATION_MARKER: &str = "...";

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Returns `true` if `text` carries control characters other than ordinary
/// whitespace. Such runs come from undecodable glyph codes and are dropped.
pub fn is_binary(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Whether a word closes a sentence.
pub fn ends_sentence(text: &str) -> bool {
    text.ends_with(['.', '?', '!'])
}

/// Clean raw extracted text.
///
/// Binary input yields an empty string. Otherwise the text is NFC-normalized,
/// ligatures are expanded, replacement characters are removed and every
/// whitespace run collapses to a single space.
///
/// With a word budget, the first `max_words` words are kept and the text
/// continues up to the next word ending a sentence. When the remainder never
/// ends a sentence the whole text is kept and [`TRUNCATION_MARKER`] is
/// appended.
pub fn normalize(raw: &str, max_words: Option<usize>) -> String {
    if is_binary(raw) {
        return String::new();
    }

    let mut expanded = String::with_capacity(raw.len());
    for c in raw.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, replacement)) => expanded.push_str(replacement),
            None if c == '\u{FFFD}' => {}
            None => expanded.push(c),
        }
    }

    let words: Vec<&str> = expanded.split_whitespace().collect();

    let limit = match max_words {
        Some(limit) if words.len() > limit => limit,
        _ => return words.join(" "),
    };

    let (prefix, rest) = words.split_at(limit);
    match rest.iter().position(|w| ends_sentence(w)) {
        Some(pos) => {
            let mut kept = prefix.to_vec();
            kept.extend_from_slice(&rest[..=pos]);
            kept.join(" ")
        }
        None => format!("{} {}", words.join(" "), TRUNCATION_MARKER),
    }
}

/// Every cased character is uppercase and at least one exists. Digits and
/// symbols do not disqualify.
pub fn is_all_upper(text: &str) -> bool {
    let mut has_upper = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_upper = true;
        }
    }
    has_upper
}

/// Standard title-casing check: uppercase letters only follow uncased
/// characters, lowercase letters only follow cased ones.
pub fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;

    for c in text.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }

    cased
}
