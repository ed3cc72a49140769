//! Entity string normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ]").unwrap());

/// Lowercase, replace every character outside `[A-Za-z0-9 ]` with a space,
/// then trim.
///
/// ```
/// use gner_core::ner::normalize_entity;
///
/// assert_eq!(normalize_entity("Arthur's Magazine"), "arthur s magazine");
/// ```
pub fn normalize_entity(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    NON_ALNUM.replace_all(&lowered, " ").trim().to_string()
}

/// Normalize every entity in order. Duplicates are kept.
pub fn normalize_entities<S: AsRef<str>>(entities: &[S]) -> Vec<String> {
    entities.iter().map(|e| normalize_entity(e.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_entity("GraphRAG"), "graphrag");
        assert_eq!(normalize_entity("  GraphRAG!  "), "graphrag");
        assert_eq!(normalize_entity("First for Women"), "first for women");
        assert_eq!(normalize_entity("Café"), "caf");
        assert_eq!(normalize_entity("?!"), "");
    }

    #[test]
    fn test_inner_punctuation_becomes_space() {
        assert_eq!(normalize_entity("U.S.A."), "u s a");
        assert_eq!(normalize_entity("New\tYork"), "new york");
    }

    #[test]
    fn test_duplicates_preserved() {
        let out = normalize_entities(&["Paris", "paris!", "Rome"]);
        assert_eq!(out, vec!["paris", "paris", "rome"]);
    }

    proptest! {
        #[test]
        fn prop_output_alphabet(s in "\\PC*") {
            let out = normalize_entity(&s);
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
            prop_assert!(!out.starts_with(' '));
            prop_assert!(!out.ends_with(' '));
        }

        #[test]
        fn prop_idempotent(s in "\\PC*") {
            let once = normalize_entity(&s);
            prop_assert_eq!(normalize_entity(&once), once.clone());
        }
    }
}
