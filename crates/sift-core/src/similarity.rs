//! Edit-distance similarity scoring.
//!
//! [`similarity`] maps the Levenshtein distance of two strings onto `[0, 1]`,
//! where `1.0` means identical. Lengths are counted in Unicode scalar values.

use serde::{Deserialize, Serialize};

/// Computes the Levenshtein edit distance between `a` and `b`.
///
/// Insertions, deletions and substitutions each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // table[j][i]: distance between the first i chars of `a` and the first j chars of `b`.
    let mut table = vec![vec![0usize; a.len() + 1]; b.len() + 1];
    for (i, cell) in table[0].iter_mut().enumerate() {
        *cell = i;
    }
    for (j, row) in table.iter_mut().enumerate() {
        row[0] = j;
    }

    for j in 1..=b.len() {
        for i in 1..=a.len() {
            let substitution = usize::from(a[i - 1] != b[j - 1]);
            table[j][i] = (table[j][i - 1] + 1)
                .min(table[j - 1][i] + 1)
                .min(table[j - 1][i - 1] + substitution);
        }
    }

    table[b.len()][a.len()]
}

/// Returns `1 - distance / max_len`, or `1.0` when both strings are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

// =============================================================================
// Options
// =============================================================================

/// Matching options for fuzzy text comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityOptions {
    /// Minimum score (inclusive) for a pattern to fire.
    pub threshold: f64,
    /// Compare lower-cased text and pattern.
    pub case_insensitive: bool,
    /// Strip surrounding whitespace from the event text.
    pub trim: bool,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            case_insensitive: true,
            trim: true,
        }
    }
}

impl SimilarityOptions {
    /// Sets the threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets case-insensitive comparison.
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Sets whitespace trimming.
    pub fn trim(mut self, enabled: bool) -> Self {
        self.trim = enabled;
        self
    }

    /// Returns a copy with `overrides` applied on top.
    pub fn merged(&self, overrides: &SimilarityOverrides) -> Self {
        Self {
            threshold: overrides.threshold.unwrap_or(self.threshold),
            case_insensitive: overrides.case_insensitive.unwrap_or(self.case_insensitive),
            trim: self.trim,
        }
    }
}

/// Per-pattern overrides for [`SimilarityOptions`].
///
/// Unset fields keep the extractor's base value. Trimming is not
/// overridable: it is applied once, before any pattern is tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityOverrides {
    /// Overrides [`SimilarityOptions::threshold`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Overrides [`SimilarityOptions::case_insensitive`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
}

impl SimilarityOverrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Overrides case sensitivity.
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = Some(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_classic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
    }

    #[test]
    fn test_similarity_identity_and_empty() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("hello", "hello"), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [
            ("hello", "helo"),
            ("kitten", "sitting"),
            ("привет", "привет!"),
            ("", "x"),
            ("abc", "cab"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_similarity_counts_chars_not_bytes() {
        // One substitution over four characters, regardless of UTF-8 width.
        assert_eq!(similarity("кот!", "кит!"), 0.75);
    }

    #[test]
    fn test_similarity_boundary() {
        assert_eq!(similarity("hello", "helo"), 0.8);
    }

    #[test]
    fn test_merge_overrides_keeps_base() {
        let base = SimilarityOptions::default().threshold(0.8);
        let merged = base.merged(&SimilarityOverrides::new().threshold(0.95));

        assert_eq!(merged.threshold, 0.95);
        assert!(merged.case_insensitive);
        assert!(merged.trim);
        assert_eq!(base.threshold, 0.8);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: SimilarityOptions =
            serde_json::from_str(r#"{ "threshold": 0.5 }"#).unwrap();
        assert_eq!(options.threshold, 0.5);
        assert!(options.trim);
    }
}
