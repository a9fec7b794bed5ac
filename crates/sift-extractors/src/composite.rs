//! ALL / ANY combinators over other extractors.
//!
//! A [`Composite`] extractor takes a [`Pattern::Items`] list of
//! `{extractor: pattern}` entries and evaluates each one by re-entering the
//! named extractor through the dispatch [`Scope`]:
//!
//! ```rust,ignore
//! dispatcher.bind("all")?.add(
//!     Pattern::items([
//!         ("text", Pattern::regex("(?i)^deploy")?),
//!         ("chat", Pattern::from(ADMIN_CHAT)),
//!     ]),
//!     deploy,
//! );
//! ```
//!
//! A branch counts as true only if its extractor exists, is subscribed to
//! the current event kind, activates, and its checker returns a match.
//! Nested handlers are never involved; on success the composite fires once
//! with `[kind]`.
//!
//! Unknown extractor names and nesting beyond the dispatcher's depth limit
//! make the branch false and are logged as malformed patterns.

use serde_json::Value;
use sift_core::{
    BoxedChecker, CheckResult, Event, EventKind, ExtractResult, Extractor, Pattern, PatternError,
    PatternItem, Scope, Subscription, checker,
};
use tracing::{trace, warn};

/// How branch verdicts are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every branch must match; an empty list never matches.
    All,
    /// At least one branch must match.
    Any,
}

/// The ALL / ANY extractor.
#[derive(Debug, Clone, Copy)]
pub struct Composite {
    mode: Mode,
}

impl Composite {
    /// Creates a composite with the given mode.
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Matches when every branch matches.
    pub fn all() -> Self {
        Self::new(Mode::All)
    }

    /// Matches when any branch matches.
    pub fn any() -> Self {
        Self::new(Mode::Any)
    }

    /// Returns the combination mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn evaluate(
        &self,
        event: &Event,
        kind: &EventKind,
        scope: Scope<'_>,
        pattern: &Pattern,
    ) -> CheckResult {
        let Pattern::Items(items) = pattern else {
            return Err(PatternError::unsupported(pattern.kind_name()));
        };

        let mut branch = |item: &PatternItem| match test_branch(item, event, kind, scope) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(extractor = %item.extractor, error = %err, "Malformed composite branch");
                false
            }
        };

        let matched = match self.mode {
            Mode::All => !items.is_empty() && items.iter().all(&mut branch),
            Mode::Any => items.iter().any(&mut branch),
        };
        Ok(matched.then(|| vec![Value::from(kind.as_str())]))
    }
}

fn test_branch(
    item: &PatternItem,
    event: &Event,
    kind: &EventKind,
    scope: Scope<'_>,
) -> Result<bool, PatternError> {
    let extractor = scope
        .lookup(&item.extractor)
        .ok_or_else(|| PatternError::UnknownExtractor(item.extractor.clone()))?;

    if !extractor.subscription().includes(kind) {
        trace!(extractor = %item.extractor, kind = %kind, "Branch extractor not subscribed");
        return Ok(false);
    }

    let nested = scope.nested()?;
    match extractor.activate(event, kind, nested) {
        Ok(Some(check)) => Ok(check.test(&item.pattern)?.is_some()),
        Ok(None) => Ok(false),
        Err(err) => {
            warn!(extractor = %item.extractor, error = %err, "Branch extractor failed to activate");
            Ok(false)
        }
    }
}

impl Extractor for Composite {
    fn subscription(&self) -> Subscription {
        Subscription::Any
    }

    fn activate<'a>(
        &'a self,
        event: &'a Event,
        kind: &'a EventKind,
        scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>> {
        Ok(Some(checker(move |pattern: &Pattern| {
            self.evaluate(event, kind, scope, pattern)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextExtractor;
    use serde_json::json;
    use sift_core::ExtractorTable;
    use std::sync::Arc;

    static CHANNEL_POST: EventKind = EventKind::ChannelPost;
    static MESSAGE: EventKind = EventKind::Message;

    fn table() -> ExtractorTable {
        let mut table = ExtractorTable::new();
        table.insert("text", Arc::new(TextExtractor)).unwrap();
        table.insert("all", Arc::new(Composite::all())).unwrap();
        table.insert("any", Arc::new(Composite::any())).unwrap();
        table
    }

    fn run(
        table: &ExtractorTable,
        limit: usize,
        name: &str,
        kind: EventKind,
        pattern: Pattern,
    ) -> bool {
        let event = Event::new(json!({ "text": "hi there" }));
        let scope = Scope::new(table, limit);
        let extractor = scope.lookup(name).unwrap();
        let check = extractor.activate(&event, &kind, scope).unwrap().unwrap();
        check.test(&pattern).unwrap().is_some()
    }

    fn hi_bye() -> Pattern {
        Pattern::items([
            ("text", Pattern::regex("(?i)hi").unwrap()),
            ("text", Pattern::regex("(?i)bye").unwrap()),
        ])
    }

    #[test]
    fn test_all_vs_any() {
        let table = table();
        assert!(!run(&table, 8, "all", EventKind::Message, hi_bye()));
        assert!(run(&table, 8, "any", EventKind::Message, hi_bye()));
    }

    #[test]
    fn test_empty_items() {
        let table = table();
        assert!(!run(&table, 8, "all", EventKind::Message, Pattern::Items(vec![])));
        assert!(!run(&table, 8, "any", EventKind::Message, Pattern::Items(vec![])));
    }

    #[test]
    fn test_unknown_extractor_branch_is_false() {
        let table = table();
        let pattern = Pattern::items([("nope", "x"), ("text", "hi there")]);
        assert!(!run(&table, 8, "all", EventKind::Message, pattern.clone()));
        assert!(run(&table, 8, "any", EventKind::Message, pattern));
    }

    #[test]
    fn test_unsubscribed_kind_branch_is_false() {
        let table = table();
        let pattern = Pattern::items([("text", "hi there")]);
        assert!(!run(&table, 8, "any", EventKind::CallbackQuery, pattern));
    }

    #[test]
    fn test_nested_composites_and_depth_limit() {
        let table = table();
        let nested = Pattern::items([("any", hi_bye())]);

        assert!(run(&table, 8, "all", EventKind::Message, nested.clone()));
        // "all" at depth 0 enters "any" at depth 1, which needs depth 2 for "text".
        assert!(!run(&table, 1, "all", EventKind::Message, nested));
    }

    #[test]
    fn test_fires_with_kind() {
        let table = table();
        let event = Event::new(json!({ "text": "hi" }));
        let scope = Scope::new(&table, 8);
        let composite = Composite::all();
        let check = composite
            .activate(&event, &CHANNEL_POST, scope)
            .unwrap()
            .unwrap();

        let values = check.test(&Pattern::items([("text", "hi")])).unwrap();
        assert_eq!(values, Some(vec![json!("channel_post")]));
    }

    #[test]
    fn test_non_composite_pattern_is_unsupported() {
        let table = table();
        let event = Event::new(json!({ "text": "hi" }));
        let composite = Composite::any();
        let check = composite
            .activate(&event, &MESSAGE, Scope::new(&table, 8))
            .unwrap()
            .unwrap();

        assert_eq!(
            check.test(&Pattern::from("hi")).unwrap_err(),
            PatternError::unsupported("literal")
        );
    }
}
