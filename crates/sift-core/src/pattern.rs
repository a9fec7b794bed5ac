//! Patterns that callers attach to extractors.
//!
//! [`Pattern`] is a closed union. The dispatcher never looks inside a
//! pattern; each extractor decides which variants it understands and
//! reports anything else as [`PatternError::Unsupported`].
//!
//! ```rust,ignore
//! use sift_core::{Pattern, SimilarityOverrides};
//!
//! let exact = Pattern::from("/start");
//! let greeting = Pattern::regex("(?i)^h(i|ello)")?;
//! let admin = Pattern::from(227295372_i64);
//! let strict = Pattern::from("hello").with_overrides(SimilarityOverrides::new().threshold(0.95));
//! let both = Pattern::items([("text", Pattern::regex("(?i)hi")?), ("chat", admin)]);
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::PatternError;
use crate::similarity::SimilarityOverrides;

/// A type-erased predicate over an extracted value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A pattern tested by an extractor's checker.
#[derive(Clone)]
pub enum Pattern {
    /// Exact string equality.
    Literal(String),
    /// Exact numeric equality.
    Number(i64),
    /// Regular expression search.
    Regex(Regex),
    /// Arbitrary predicate over the extracted value.
    Predicate(Predicate),
    /// An inner pattern with per-pattern similarity options.
    WithOverrides(Box<Pattern>, SimilarityOverrides),
    /// Named sub-patterns evaluated by a composite extractor.
    Items(Vec<PatternItem>),
}

/// One `{extractor: pattern}` entry of a composite pattern.
#[derive(Debug, Clone)]
pub struct PatternItem {
    /// Name of the extractor that interprets `pattern`.
    pub extractor: String,
    /// The nested pattern.
    pub pattern: Pattern,
}

impl Pattern {
    /// Creates a literal pattern.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Compiles a regular-expression pattern.
    pub fn regex(re: &str) -> Result<Self, regex::Error> {
        Regex::new(re).map(Self::Regex)
    }

    /// Creates a predicate pattern.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Creates a composite pattern from `(extractor, pattern)` pairs.
    pub fn items<I, N, P>(items: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<Pattern>,
    {
        Self::Items(
            items
                .into_iter()
                .map(|(extractor, pattern)| PatternItem {
                    extractor: extractor.into(),
                    pattern: pattern.into(),
                })
                .collect(),
        )
    }

    /// Attaches similarity overrides to this pattern.
    pub fn with_overrides(self, overrides: SimilarityOverrides) -> Self {
        match self {
            Self::WithOverrides(inner, _) => Self::WithOverrides(inner, overrides),
            other => Self::WithOverrides(Box::new(other), overrides),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Number(_) => "number",
            Self::Regex(_) => "regex",
            Self::Predicate(_) => "predicate",
            Self::WithOverrides(..) => "override",
            Self::Items(_) => "composite",
        }
    }

    /// Tests a string value with the common literal/regex/predicate rules.
    ///
    /// Any other variant is reported as unsupported.
    pub fn matches_str(&self, value: &str) -> Result<bool, PatternError> {
        match self {
            Self::Literal(expected) => Ok(expected == value),
            Self::Regex(re) => Ok(re.is_match(value)),
            Self::Predicate(f) => Ok(f(&Value::String(value.to_string()))),
            other => Err(PatternError::unsupported(other.kind_name())),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::WithOverrides(inner, overrides) => f
                .debug_tuple("WithOverrides")
                .field(inner)
                .field(overrides)
                .finish(),
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
        }
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Pattern {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<i64> for Pattern {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Regex> for Pattern {
    fn from(value: Regex) -> Self {
        Self::Regex(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_str() {
        assert!(Pattern::from("hi").matches_str("hi").unwrap());
        assert!(!Pattern::from("hi").matches_str("Hi").unwrap());
        assert!(Pattern::regex("(?i)^h").unwrap().matches_str("Hey").unwrap());
        assert!(
            Pattern::predicate(|v| v.as_str().is_some_and(|s| s.len() > 3))
                .matches_str("hello")
                .unwrap()
        );
    }

    #[test]
    fn test_matches_str_rejects_other_variants() {
        let err = Pattern::from(5_i64).matches_str("5").unwrap_err();
        assert_eq!(err, PatternError::unsupported("number"));
    }

    #[test]
    fn test_with_overrides_replaces_existing() {
        let pattern = Pattern::from("x")
            .with_overrides(SimilarityOverrides::new().threshold(0.5))
            .with_overrides(SimilarityOverrides::new().case_insensitive(false));

        match pattern {
            Pattern::WithOverrides(inner, overrides) => {
                assert!(matches!(*inner, Pattern::Literal(ref s) if s == "x"));
                assert_eq!(overrides.threshold, None);
                assert_eq!(overrides.case_insensitive, Some(false));
            }
            other => panic!("unexpected pattern: {other:?}"),
        }
    }

    #[test]
    fn test_items_builder() {
        let pattern = Pattern::items([("text", "hi"), ("hashtag", "#rust")]);
        let Pattern::Items(items) = pattern else {
            panic!("expected composite");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].extractor, "hashtag");
    }
}
