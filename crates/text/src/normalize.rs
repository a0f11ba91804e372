use crate::roman::is_roman_numeral;

/// Words never capitalized inside a title (always capitalized as first word).
const ARTICLES: [&str; 7] = ["a", "an", "of", "the", "is", "in", "to"];
/// Narrower article set stripped from the front of a title ordering key.
const TITLE_ARTICLES: [&str; 3] = ["a", "an", "the"];
/// Honorifics and suffixes stripped from person ordering keys.
const HONORIFICS: [&str; 14] =
    ["sir", "sire", "mrs", "miss", "ms", "lord", "dr", "phd", "dphil", "md", "do", "doc", "sr", "jr"];

const WORD_SEPARATOR: &str = " ";

/// Reduces `text` to its canonical form: only alphanumerics and the ASCII
/// space survive, lower-cased. This is the basis for every cataloguing key
/// and every content fingerprint.
pub fn normalize(text: impl AsRef<str>) -> String {
    text.as_ref()
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_numeric() || *c == ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Capitalizes the first alphabetic character of each word, lower-casing the
/// rest, with three exceptions:
///
/// - A word already containing two or more uppercase letters is left alone
///   unless `force_lower` is set. Keeps acronyms like `UofA` intact.
/// - A well-formed roman numeral is rendered fully upper-case.
/// - Articles (`a an of the is in to`) stay lower-case, except as the very
///   first word of the string, which is always capitalized.
pub fn title_case(text: impl AsRef<str>, force_lower: bool) -> String {
    let mut words: Vec<String> =
        text.as_ref().split(' ').map(|word| capitalize(word, force_lower, false)).collect();
    if let Some(first) = words.first_mut() {
        *first = capitalize(first, false, true);
    }
    words.join(WORD_SEPARATOR)
}

/// Derives the cataloguing key for a book title: normalized, with the
/// leading run of `a an the` dropped. Only a contiguous prefix is removed;
/// stripping stops at the first non-article word.
pub fn title_ordering_key(text: impl AsRef<str>) -> String {
    let normalized = normalize(text);
    normalized
        .split_whitespace()
        .skip_while(|word| TITLE_ARTICLES.contains(word))
        .collect::<Vec<_>>()
        .join(WORD_SEPARATOR)
}

/// Derives the cataloguing key for a person name: normalized, with every
/// honorific and roman-numeral word removed (anywhere in the name, not just
/// a prefix), then the last remaining word rotated to the front so the key
/// reads surname-first. A single remaining word is left as-is.
pub fn person_ordering_key(text: impl AsRef<str>) -> String {
    let normalized = normalize(text);
    let mut words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|word| !HONORIFICS.contains(word) && !is_roman_numeral(word))
        .collect();
    if let Some(surname) = words.pop() {
        words.insert(0, surname);
    }
    words.join(WORD_SEPARATOR)
}

fn capitalize(word: &str, force_lower: bool, capitalize_articles: bool) -> String {
    if !force_lower && word.chars().filter(|c| c.is_uppercase()).count() >= 2 {
        return word.to_string();
    }
    let lowered = word.to_lowercase();
    if is_roman_numeral(&lowered) {
        return word.to_uppercase();
    }
    if !capitalize_articles && ARTICLES.contains(&lowered.as_str()) {
        return lowered;
    }
    let mut result = String::with_capacity(lowered.len());
    let mut pending = false;
    for c in lowered.chars() {
        if !pending && c.is_alphabetic() {
            result.extend(c.to_uppercase());
            pending = true;
        } else {
            result.push(c);
        }
    }
    result
}
