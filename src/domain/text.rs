//! Loose comparison of free-text answers and names.

use std::sync::LazyLock;

use regex::Regex;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{P}\p{S}]+").expect("valid punctuation pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Reduces text to a comparison key: lowercased, punctuation and symbols
/// removed, whitespace collapsed.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, " ");
    WHITESPACE.replace_all(stripped.trim(), " ").trim().to_string()
}

/// Whether two free-text answers match ignoring case and punctuation.
#[must_use]
pub fn loosely_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Whether two names collide: equal after trimming, ignoring case.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Two heights", "two heights"; "case")]
    #[test_case("two heights.", "two heights"; "trailing punctuation")]
    #[test_case("«две» высоты", "две высоты"; "guillemets")]
    #[test_case("две  высоты ", "две высоты"; "whitespace")]
    #[test_case("front-back", "front back"; "hyphen")]
    fn loosely_equal_ignores_noise(a: &str, b: &str) {
        assert!(loosely_equal(a, b));
    }

    #[test]
    fn loosely_equal_keeps_words_distinct() {
        assert!(!loosely_equal("две высоты", "три высоты"));
    }

    #[test]
    fn same_name_is_case_insensitive_only() {
        assert!(same_name("Vowel Height", " vowel height"));
        assert!(!same_name("vowel height.", "vowel height"));
    }
}
