//! The extractor protocol.
//!
//! An [`Extractor`] pulls a comparable value out of an event and hands back
//! a short-lived [`Checker`] that tests caller patterns against it:
//!
//! ```text
//! Dispatcher ──activate(event, kind)──▶ Extractor
//!            ◀──── Some(checker) ─────
//!            ──── test(pattern) ─────▶ checker ──▶ Some(values) ──▶ handler
//! ```
//!
//! A checker only lives for one dispatch cycle. It closes over whatever the
//! extractor read from the event and must not be retained.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_core::{
//!     BoxedChecker, Event, EventKind, ExtractResult, Extractor, Scope, Subscription, checker,
//! };
//!
//! struct Caption;
//!
//! impl Extractor for Caption {
//!     fn subscription(&self) -> Subscription {
//!         Subscription::kinds([EventKind::Message])
//!     }
//!
//!     fn activate<'a>(
//!         &'a self,
//!         event: &'a Event,
//!         _kind: &'a EventKind,
//!         _scope: Scope<'a>,
//!     ) -> ExtractResult<Option<BoxedChecker<'a>>> {
//!         let Some(caption) = event.str_field("caption") else {
//!             return Ok(None);
//!         };
//!         Ok(Some(checker(move |pattern| {
//!             Ok(pattern.matches_str(caption)?.then(|| vec![caption.into()]))
//!         })))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ExtractResult, PatternError, RegistryError, RegistryResult};
use crate::event::{Event, EventKind};
use crate::pattern::Pattern;

// =============================================================================
// Subscription
// =============================================================================

/// The event kinds an extractor wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Every event, whatever its kind.
    Any,
    /// Only the listed kinds.
    Kinds(Vec<EventKind>),
}

impl Subscription {
    /// Subscribes to the given kinds; an empty list means [`Subscription::Any`].
    pub fn kinds<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<EventKind>,
    {
        let kinds: Vec<EventKind> = kinds.into_iter().map(Into::into).collect();
        if kinds.is_empty() {
            Self::Any
        } else {
            Self::Kinds(kinds)
        }
    }

    /// Returns `true` if events of `kind` are delivered under this subscription.
    pub fn includes(&self, kind: &EventKind) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.contains(kind),
        }
    }
}

// =============================================================================
// Checker
// =============================================================================

/// Values an extractor hands to a handler when a pattern matches.
pub type Captures = Vec<Value>;

/// Outcome of testing one pattern: `Some(values)` on a match.
pub type CheckResult = Result<Option<Captures>, PatternError>;

/// Tests patterns against the values extracted from one event.
pub trait Checker {
    /// Tests `pattern`, returning the handler arguments on a match.
    fn test(&self, pattern: &Pattern) -> CheckResult;
}

impl<F> Checker for F
where
    F: Fn(&Pattern) -> CheckResult,
{
    fn test(&self, pattern: &Pattern) -> CheckResult {
        self(pattern)
    }
}

/// A boxed checker borrowing from the event it was built for.
pub type BoxedChecker<'a> = Box<dyn Checker + 'a>;

/// Boxes a closure as a checker.
pub fn checker<'a, F>(f: F) -> BoxedChecker<'a>
where
    F: Fn(&Pattern) -> CheckResult + 'a,
{
    Box::new(f)
}

// =============================================================================
// Extractor
// =============================================================================

/// A component that derives a value from events and tests patterns against it.
pub trait Extractor: Send + Sync {
    /// The event kinds this extractor is indexed under.
    fn subscription(&self) -> Subscription;

    /// Prepares a checker for `event`.
    ///
    /// Returns `Ok(None)` when the event lacks the fields this extractor
    /// needs. Errors are reserved for fields that are present but cannot be
    /// interpreted.
    fn activate<'a>(
        &'a self,
        event: &'a Event,
        kind: &'a EventKind,
        scope: Scope<'a>,
    ) -> ExtractResult<Option<BoxedChecker<'a>>>;
}

/// A shared, type-erased extractor.
pub type BoxedExtractor = Arc<dyn Extractor>;

// =============================================================================
// ExtractorTable
// =============================================================================

/// Registered extractors by name, in registration order.
#[derive(Default, Clone)]
pub struct ExtractorTable {
    entries: HashMap<String, BoxedExtractor>,
    order: Vec<String>,
}

impl ExtractorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extractor; an existing name is left untouched.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        extractor: BoxedExtractor,
    ) -> RegistryResult<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateExtractorName(name));
        }
        self.order.push(name.clone());
        self.entries.insert(name, extractor);
        Ok(())
    }

    /// Looks up an extractor by name.
    pub fn get(&self, name: &str) -> Option<&BoxedExtractor> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of registered extractors.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no extractor is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ExtractorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.order).finish()
    }
}

// =============================================================================
// Scope
// =============================================================================

/// What an extractor can see of its surroundings during activation.
///
/// Composite extractors use the scope to look up and re-enter sibling
/// extractors; the depth counter bounds how far they may nest.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    table: &'a ExtractorTable,
    depth: usize,
    limit: usize,
}

impl<'a> Scope<'a> {
    /// Creates a top-level scope over `table`.
    pub fn new(table: &'a ExtractorTable, limit: usize) -> Self {
        Self {
            table,
            depth: 0,
            limit,
        }
    }

    /// Looks up a sibling extractor by name.
    pub fn lookup(&self, name: &str) -> Option<&'a dyn Extractor> {
        let extractor: &'a dyn Extractor = self.table.get(name)?.as_ref();
        Some(extractor)
    }

    /// Current composite nesting depth (0 at the top level).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the scope for one more level of nesting.
    pub fn nested(self) -> Result<Self, PatternError> {
        if self.depth >= self.limit {
            return Err(PatternError::DepthExceeded { limit: self.limit });
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}
