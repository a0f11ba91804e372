use regex::Regex;
use std::sync::LazyLock;

// Standard subtractive notation, lower-case. The grammar alone matches the
// empty string (every group is optional), so emptiness is checked separately.
static ROMAN_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^m{0,3}(cm|cd|d?c{0,3})(xc|xl|l?x{0,3})(ix|iv|v?i{0,3})$").unwrap());

/// Returns `true` if `word` is a well-formed roman numeral (case-insensitive).
///
/// Only subtractive notation is accepted: `iv` is a numeral, `iiii` is not.
pub fn is_roman_numeral(word: impl AsRef<str>) -> bool {
    let word = word.as_ref().to_lowercase();
    !word.is_empty() && ROMAN_NUMERAL.is_match(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("i")]
    #[case("iv")]
    #[case("ix")]
    #[case("XIV")]
    #[case("mcmxcix")]
    #[case("MMXXV")]
    #[case("iii")]
    fn accepts_well_formed_numerals(#[case] word: &str) {
        assert!(is_roman_numeral(word), "{word} should be a roman numeral");
    }

    #[rstest]
    #[case("")]
    #[case("iiii")]
    #[case("vv")]
    #[case("ixx")]
    #[case("im")]
    #[case("newton")]
    #[case("xjx")]
    fn rejects_malformed_words(#[case] word: &str) {
        assert!(!is_roman_numeral(word), "{word} should not be a roman numeral");
    }
}
