use crate::normalize;
use sha2::{Digest, Sha256};

const SEPARATOR: u8 = b'|';

/// SHA-256 over the normalized form of `text`, rendered as uppercase hex.
///
/// Deterministic and case/punctuation-insensitive by construction: two
/// strings that differ only in case or punctuation normalize identically and
/// therefore fingerprint identically. Word order still matters, so
/// `"King Stephen"` and `"Stephen King"` are distinct.
pub fn fingerprint(text: impl AsRef<str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    to_uppercase_hex(&hasher.finalize())
}

/// Fingerprint of a book: the normalized title followed by each credited
/// contributor's fingerprint, in attach order, joined by a separator byte
/// that cannot occur in either component.
///
/// Book identity therefore depends on *which* contributors are attached and
/// in what order they were attached. Callers keep their credit list as an
/// explicitly ordered sequence, which makes this deterministic; see the crate
/// documentation for the reasoning.
pub fn book_fingerprint<I, S>(title: impl AsRef<str>, contributor_hashes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    for hash in contributor_hashes {
        hasher.update([SEPARATOR]);
        hasher.update(hash.as_ref().as_bytes());
    }
    to_uppercase_hex(&hasher.finalize())
}

fn to_uppercase_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Stephen King", "STEPHEN KING")]
    #[case("Stephen King", "stephen king")]
    #[case("'Salem's Lot", "Salems Lot")]
    fn case_and_punctuation_insensitive(#[case] a: &str, #[case] b: &str) {
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn word_order_is_significant() {
        assert_ne!(fingerprint("Stephen King"), fingerprint("King Stephen"));
    }

    #[test]
    fn renders_uppercase_hex() {
        let hash = fingerprint("The Gunslinger");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn book_identity_tracks_contributor_set() {
        let king = fingerprint("Stephen King");
        let straub = fingerprint("Peter Straub");
        let solo = book_fingerprint("The Talisman", [&king]);
        let duo = book_fingerprint("The Talisman", [&king, &straub]);
        assert_ne!(solo, duo);
    }

    #[test]
    fn book_identity_tracks_attach_order() {
        let king = fingerprint("Stephen King");
        let straub = fingerprint("Peter Straub");
        let ab = book_fingerprint("The Talisman", [&king, &straub]);
        let ba = book_fingerprint("The Talisman", [&straub, &king]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn title_only_book_matches_plain_fingerprint() {
        // No credits attached yet: identical to the bare title fingerprint.
        assert_eq!(book_fingerprint("It", Vec::<String>::new()), fingerprint("It"));
    }
}
