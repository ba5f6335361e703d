//! Turkish-aware string ordering.

use std::cmp::Ordering;

const ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

/// Compares two strings the way a Turkish reader orders them.
///
/// Letters follow the Turkish alphabet (`ç` after `c`, `ı` before `i`, ...)
/// and case is ignored; strings equal under that order fall back to a
/// plain comparison so the result is total.
#[must_use]
pub fn collate(left: &str, right: &str) -> Ordering {
    left.chars()
        .map(weight)
        .cmp(right.chars().map(weight))
        .then_with(|| left.cmp(right))
}

/// Lowercases text with Turkish dotted/dotless `i` rules.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold).collect()
}

fn weight(c: char) -> u32 {
    let folded = fold(c);
    match ALPHABET.chars().position(|letter| letter == folded) {
        Some(index) => 0x1_0000 + u32::try_from(index).unwrap_or(0),
        None if folded.is_ascii() => u32::from(folded),
        None => 0x2_0000 + u32::from(folded),
    }
}

fn fold(c: char) -> char {
    match c {
        'I' => 'ı',
        'İ' => 'i',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_letters_sort_after_their_base() {
        let mut words = vec!["Zeynep", "Çiğdem", "Cem", "Dilek", "Şule", "Selin", "Ömer", "Oya"];
        words.sort_by(|a, b| collate(a, b));
        assert_eq!(
            words,
            ["Cem", "Çiğdem", "Dilek", "Oya", "Ömer", "Selin", "Şule", "Zeynep"]
        );
    }

    #[test]
    fn test_fold_case() {
        assert_eq!(fold_case("KİTAP"), "kitap");
        assert_eq!(fold_case("IŞIK"), "ışık");
    }

    #[test]
    fn test_dotless_i_before_i() {
        assert_eq!(collate("ılık", "iğne"), Ordering::Less);
        assert_eq!(collate("Irmak", "İpek"), Ordering::Less);
    }

    #[test]
    fn test_case_insensitive_with_total_fallback() {
        assert_eq!(collate("roman", "Şiir"), Ordering::Less);
        assert_eq!(collate("Bilim", "bilim"), "Bilim".cmp("bilim"));
        assert_eq!(collate("abc", "abc"), Ordering::Equal);
        assert_eq!(collate("ab", "abc"), Ordering::Less);
    }
}
