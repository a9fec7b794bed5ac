//! Fuzzy text matching.
//!
//! [`SimilarityExtractor`] scores the message text against each registered
//! pattern with [`similarity`](sift_core::similarity) and fires every pattern
//! whose score reaches the threshold. It is a threshold gate, not a
//! best-match selector: several patterns may fire for the same message.
//!
//! Accepted patterns:
//!
//! | pattern | score |
//! |---|---|
//! | `Literal(p)` | `similarity(text, p)` |
//! | `Regex(re)` | `similarity(text, m)` for the first match `m`, no fire without a match |
//! | `WithOverrides(p, o)` | as `p`, with `o` merged over the extractor options |
//!
//! With case folding on, both sides are lower-cased before scoring and
//! regexes match case-insensitively. Trimming comes from the base options
//! and is applied once per event.
//!
//! Handlers receive `[text, score]`, where `text` is the (possibly trimmed)
//! message text in its original case.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use sift_core::{
    BoxedChecker, CheckResult, Event, EventKind, ExtractResult, Extractor, Pattern, PatternError,
    Scope, SimilarityOptions, Subscription, checker, similarity,
};

/// Scores message text against literal and regex patterns.
#[derive(Debug, Clone, Default)]
pub struct SimilarityExtractor {
    options: SimilarityOptions,
}

impl SimilarityExtractor {
    /// Creates an extractor with the given base options.
    pub fn new(options: SimilarityOptions) -> Self {
        Self { options }
    }

    /// Returns the base options.
    pub fn options(&self) -> &SimilarityOptions {
        &self.options
    }

    fn evaluate(&self, text: &str, pattern: &Pattern) -> CheckResult {
        let (inner, options) = match pattern {
            Pattern::WithOverrides(inner, overrides) => {
                (inner.as_ref(), self.options.merged(overrides))
            }
            other => (other, self.options),
        };
        let folded = fold(text, options.case_insensitive);

        let score = match inner {
            Pattern::Literal(expected) => {
                similarity(&folded, &fold(expected, options.case_insensitive))
            }
            Pattern::Regex(re) => {
                let Some(found) = effective_regex(re, options.case_insensitive).find(text) else {
                    return Ok(None);
                };
                similarity(&folded, &fold(found.as_str(), options.case_insensitive))
            }
            other => return Err(PatternError::unsupported(other.kind_name())),
        };

        Ok((score >= options.threshold).then(|| vec![Value::from(text), Value::from(score)]))
    }
}

/// The regex as written, or a case-insensitive rebuild of it.
fn effective_regex(re: &Regex, case_insensitive: bool) -> Cow<'_, Regex> {
    if !case_insensitive {
        return Cow::Borrowed(re);
    }
    RegexBuilder::new(re.as_str())
        .case_insensitive(true)
        .build()
        .map_or(Cow::Borrowed(re), Cow::Owned)
}

fn fold(s: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(s.to_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}

impl Extractor for SimilarityExtractor {
    fn subscription(&self) -> Subscription {
        Subscription::kinds([EventKind::Message, EventKind::ChannelPost])
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        _kind: &'a EventKind,
        _scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        let Some(raw) = event.text_or_caption() else {
            return Ok(None);
        };
        let text = if self.options.trim { raw.trim() } else { raw };
        Ok(Some(checker(move |pattern: &Pattern| {
            self.evaluate(text, pattern)
        })))
    }
}
