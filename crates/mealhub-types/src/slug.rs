//! Slug derivation.
//!
//! A slug is lowercase ASCII alphanumerics separated by single hyphens, with
//! no hyphen at either end. Deriving a slug from a slug returns it unchanged.
//! Distinct inputs may collide (`"Ben's"` and `"Ben S"` both become
//! `"ben-s"`); there is no disambiguating suffix.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonical, URL- and key-safe identifier fragment.
///
/// May be empty when the input held no ASCII alphanumerics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from arbitrary text.
    pub fn derive(text: &str) -> Self {
        let mut out = String::with_capacity(text.len());
        let mut pending_hyphen = false;

        for ch in text.chars().flat_map(char::to_lowercase) {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(ch);
            } else {
                pending_hyphen = true;
            }
        }

        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Shorthand for [`Slug::derive`].
///
/// ```
/// use mealhub_types::slugify;
///
/// assert_eq!(slugify("Ben's Chili  Bowl!").as_str(), "ben-s-chili-bowl");
/// assert!(slugify("   ").is_empty());
/// ```
pub fn slugify(text: &str) -> Slug {
    Slug::derive(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn punctuation_and_whitespace_collapse() {
        assert_eq!(slugify("Ben's Chili  Bowl!").as_str(), "ben-s-chili-bowl");
        assert_eq!(slugify("Grilled Cheese").as_str(), "grilled-cheese");
        assert_eq!(slugify("a -- b").as_str(), "a-b");
    }

    #[test]
    fn leading_and_trailing_separators_are_stripped() {
        assert_eq!(slugify("  --Tacos--  ").as_str(), "tacos");
        assert_eq!(slugify("!pho!").as_str(), "pho");
    }

    #[test]
    fn empty_and_blank_input_yield_empty_slug() {
        assert!(slugify("").is_empty());
        assert!(slugify(" \t\n").is_empty());
        assert!(slugify("!!!").is_empty());
    }

    #[test]
    fn digits_survive() {
        assert_eq!(slugify("Combo #2 (Large)").as_str(), "combo-2-large");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(slugify("Crème Brûlée").as_str(), "cr-me-br-l-e");
    }

    #[test]
    fn uppercase_is_lowered() {
        assert_eq!(slugify("DOWNTOWN").as_str(), "downtown");
    }

    #[test]
    fn visually_similar_inputs_collide() {
        assert_eq!(slugify("Ben's"), slugify("ben s"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&slugify("Hot Dog")).unwrap();
        assert_eq!(json, "\"hot-dog\"");
    }

    proptest! {
        #[test]
        fn derive_is_idempotent(text in any::<String>()) {
            let once = slugify(&text);
            let twice = slugify(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn output_alphabet_is_key_safe(text in any::<String>()) {
            let slug = slugify(&text);
            let s = slug.as_str();
            prop_assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!s.starts_with('-'));
            prop_assert!(!s.ends_with('-'));
            prop_assert!(!s.contains("--"));
        }
    }
}
