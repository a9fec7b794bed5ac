//! Event dispatcher and pattern registry.
//!
//! The [`Dispatcher`] owns three tables:
//!
//! - the extractors, by name
//! - an index from [`EventKind`] to the extractors subscribed to it, plus a
//!   separate bucket for extractors subscribed to any kind
//! - per extractor, the insertion-ordered list of `(pattern, handler)` routes
//!
//! When an event is dispatched:
//!
//! 1. Extractors indexed under the event's kind run first, then the
//!    "any kind" bucket, each in registration order
//! 2. Extractors without routes are skipped before activation
//! 3. Each activated extractor's checker is fed every route in insertion
//!    order, and matching handlers are invoked
//!
//! Failures in one extractor, pattern or handler are logged and collected
//! into the [`DispatchReport`]; they never stop the rest of the dispatch.
//!
//! ```rust,ignore
//! use sift_core::{Dispatcher, Matched, Pattern};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("text", TextExtractor)?;
//!
//! dispatcher
//!     .bind("text")?
//!     .add("ping", |m: &Matched<'_>| info!("pong"))
//!     .add(Pattern::regex("(?i)hello")?, greet);
//!
//! let report = dispatcher.dispatch(&update.event, &update.kind);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, debug, error, span, trace, warn};

use crate::error::{EventProcessingError, RegistryError, RegistryResult};
use crate::event::{Event, EventKind};
use crate::extractor::{BoxedChecker, Extractor, ExtractorTable, Scope, Subscription};
use crate::handler::{BoxedHandler, HandlerOutput, Matched, into_handler};
use crate::pattern::Pattern;

/// Default bound on composite pattern nesting.
pub const DEFAULT_DEPTH_LIMIT: usize = 8;

/// One registered `(pattern, handler)` pair.
#[derive(Clone)]
struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
}

/// Routes of one extractor, shared copy-on-write with in-flight dispatches.
type RouteList = Arc<Vec<Route>>;

// =============================================================================
// DispatchReport
// =============================================================================

/// Summary of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Extractors that produced a checker.
    pub activated: usize,
    /// Handlers that ran to completion.
    pub fired: usize,
    /// Recoverable failures, in the order they happened.
    pub errors: Vec<EventProcessingError>,
}

impl DispatchReport {
    /// Returns `true` if nothing failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, err: EventProcessingError) {
        if err.is_malformed_pattern() {
            warn!(error = %err, "Skipping malformed pattern");
        } else {
            error!(error = %err, "Event processing failed");
        }
        self.errors.push(err);
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// The central registry and event router.
///
/// Extractors are registered during setup through `&mut self`; patterns are
/// bound through `&self`, so registration stays possible after the
/// dispatcher has been shared (including from inside a handler). Each
/// dispatch works on a snapshot of the route lists it needs.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync` and can be shared behind an `Arc`.
pub struct Dispatcher {
    extractors: ExtractorTable,
    by_kind: HashMap<EventKind, Vec<String>>,
    any_kind: Vec<String>,
    routes: RwLock<HashMap<String, RouteList>>,
    depth_limit: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self {
            extractors: ExtractorTable::new(),
            by_kind: HashMap::new(),
            any_kind: Vec::new(),
            routes: RwLock::new(HashMap::new()),
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    /// Sets the maximum composite nesting depth (builder pattern).
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Returns the composite nesting bound.
    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Registers an extractor under `name`.
    ///
    /// Fails with [`RegistryError::DuplicateExtractorName`] if the name is
    /// taken; the existing extractor is kept.
    pub fn register<E>(&mut self, name: impl Into<String>, extractor: E) -> RegistryResult<()>
    where
        E: Extractor + 'static,
    {
        self.register_arc(name, Arc::new(extractor))
    }

    /// Registers an already shared extractor under `name`.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> RegistryResult<()> {
        let name = name.into();
        let subscription = extractor.subscription();
        self.extractors.insert(name.clone(), extractor)?;

        match subscription {
            Subscription::Any => self.any_kind.push(name.clone()),
            Subscription::Kinds(kinds) => {
                for kind in kinds {
                    let bucket = self.by_kind.entry(kind).or_default();
                    if !bucket.contains(&name) {
                        bucket.push(name.clone());
                    }
                }
            }
        }

        self.routes.write().insert(name.clone(), Arc::default());
        debug!(extractor = %name, "Registered extractor");
        Ok(())
    }

    /// Returns a registrar for adding patterns to extractor `name`.
    ///
    /// Fails with [`RegistryError::UnknownExtractorName`] if no extractor was
    /// registered under that name.
    pub fn bind(&self, name: &str) -> RegistryResult<Registrar<'_>> {
        if !self.extractors.contains(name) {
            return Err(RegistryError::UnknownExtractorName(name.to_string()));
        }
        Ok(Registrar {
            dispatcher: self,
            name: name.to_string(),
        })
    }

    /// Returns `true` if an extractor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.extractors.contains(name)
    }

    /// Registered extractor names, in registration order.
    pub fn extractor_names(&self) -> Vec<&str> {
        self.extractors.names().collect()
    }

    /// Number of patterns bound to extractor `name`.
    pub fn route_count(&self, name: &str) -> usize {
        self.routes.read().get(name).map_or(0, |routes| routes.len())
    }

    /// Returns a top-level scope over this dispatcher's extractors.
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.extractors, self.depth_limit)
    }

    /// Dispatches one event.
    ///
    /// Runs every extractor subscribed to `kind`, then every extractor
    /// subscribed to any kind. Never panics and never returns an error: all
    /// failures end up in the returned report.
    pub fn dispatch(&self, event: &Event, kind: &EventKind) -> DispatchReport {
        let span = span!(Level::DEBUG, "dispatch", kind = %kind);
        let _enter = span.enter();

        let mut report = DispatchReport::default();
        let scope = self.scope();
        let bucket = self.by_kind.get(kind).map(Vec::as_slice).unwrap_or_default();

        for name in bucket.iter().chain(self.any_kind.iter()) {
            self.run_extractor(name, event, kind, scope, &mut report);
        }

        trace!(
            activated = report.activated,
            fired = report.fired,
            errors = report.errors.len(),
            "Dispatch finished"
        );
        report
    }

    fn run_extractor(
        &self,
        name: &str,
        event: &Event,
        kind: &EventKind,
        scope: Scope<'_>,
        report: &mut DispatchReport,
    ) {
        // Snapshot so handlers may register patterns without deadlocking.
        let routes = match self.routes.read().get(name) {
            Some(routes) if !routes.is_empty() => Arc::clone(routes),
            _ => {
                trace!(extractor = name, "No patterns bound, skipping");
                return;
            }
        };
        let Some(extractor) = self.extractors.get(name) else {
            return;
        };

        let activation =
            panic::catch_unwind(AssertUnwindSafe(|| extractor.activate(event, kind, scope)));
        let checker: BoxedChecker<'_> = match activation {
            Ok(Ok(Some(checker))) => checker,
            Ok(Ok(None)) => {
                trace!(extractor = name, "Extractor not applicable");
                return;
            }
            Ok(Err(source)) => {
                report.fail(EventProcessingError::Activation {
                    extractor: name.to_string(),
                    source,
                });
                return;
            }
            Err(payload) => {
                report.fail(EventProcessingError::Panic {
                    extractor: name.to_string(),
                    stage: "activation",
                    message: panic_message(payload.as_ref()),
                });
                return;
            }
        };
        report.activated += 1;

        for (index, route) in routes.iter().enumerate() {
            let verdict = panic::catch_unwind(AssertUnwindSafe(|| checker.test(&route.pattern)));
            let values = match verdict {
                Ok(Ok(Some(values))) => values,
                Ok(Ok(None)) => continue,
                Ok(Err(source)) => {
                    report.fail(EventProcessingError::Pattern {
                        extractor: name.to_string(),
                        index,
                        source,
                    });
                    continue;
                }
                Err(payload) => {
                    report.fail(EventProcessingError::Panic {
                        extractor: name.to_string(),
                        stage: "pattern test",
                        message: panic_message(payload.as_ref()),
                    });
                    continue;
                }
            };

            let matched = Matched {
                event,
                kind,
                extractor: name,
                values,
            };
            match panic::catch_unwind(AssertUnwindSafe(|| route.handler.call(&matched))) {
                Ok(Ok(())) => {
                    report.fired += 1;
                    debug!(extractor = name, route = index, "Handler fired");
                }
                Ok(Err(source)) => report.fail(EventProcessingError::Handler {
                    extractor: name.to_string(),
                    index,
                    source,
                }),
                Err(payload) => report.fail(EventProcessingError::Panic {
                    extractor: name.to_string(),
                    stage: "handler",
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("extractors", &self.extractors)
            .field("any_kind", &self.any_kind)
            .field("depth_limit", &self.depth_limit)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// Registrar
// =============================================================================

/// Fluent handle for binding patterns to one extractor.
///
/// Obtained from [`Dispatcher::bind`]. Routes are appended in call order,
/// which is also the order they are tested in.
pub struct Registrar<'d> {
    dispatcher: &'d Dispatcher,
    name: String,
}

impl<'d> Registrar<'d> {
    /// Appends a `(pattern, handler)` route and returns the registrar.
    pub fn add<P, F, R>(self, pattern: P, handler: F) -> Self
    where
        P: Into<Pattern>,
        F: Fn(&Matched<'_>) -> R + Send + Sync + 'static,
        R: HandlerOutput + 'static,
    {
        self.add_boxed(pattern.into(), into_handler(handler))
    }

    /// Appends a route with a pre-built boxed handler.
    pub fn add_boxed(self, pattern: Pattern, handler: BoxedHandler) -> Self {
        {
            let mut routes = self.dispatcher.routes.write();
            let list = routes.entry(self.name.clone()).or_default();
            Arc::make_mut(list).push(Route { pattern, handler });
        }
        trace!(extractor = %self.name, "Bound pattern");
        self
    }

    /// Switches to another extractor, keeping the chain going.
    pub fn bind(self, name: &str) -> RegistryResult<Registrar<'d>> {
        self.dispatcher.bind(name)
    }

    /// Name of the extractor this registrar adds to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, ExtractResult, PatternError};
    use crate::extractor::checker;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reads `text` and matches literals/regexes against it.
    struct TextLike {
        kinds: Vec<&'static str>,
        activations: Arc<AtomicUsize>,
    }

    impl TextLike {
        fn new(kinds: Vec<&'static str>) -> Self {
            Self {
                kinds,
                activations: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Extractor for TextLike {
        fn subscription(&self) -> Subscription {
            Subscription::kinds(self.kinds.iter().copied())
        }

        fn activate<'a>(
            &'a self,
            event: &'a Event,
            _kind: &'a EventKind,
            _scope: Scope<'a>,
        ) -> ExtractResult<Option<BoxedChecker<'a>>> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            let Some(text) = event.str_field("text") else {
                return Ok(None);
            };
            Ok(Some(checker(move |pattern: &Pattern| {
                Ok(pattern.matches_str(text)?.then(|| vec![Value::from(text)]))
            })))
        }
    }

    struct Exploding;

    impl Extractor for Exploding {
        fn subscription(&self) -> Subscription {
            Subscription::Any
        }

        fn activate<'a>(
            &'a self,
            _event: &'a Event,
            _kind: &'a EventKind,
            _scope: Scope<'a>,
        ) -> ExtractResult<Option<BoxedChecker<'a>>> {
            Err(ExtractError::custom("cannot read event"))
        }
    }

    struct Panicking;

    impl Extractor for Panicking {
        fn subscription(&self) -> Subscription {
            Subscription::Any
        }

        fn activate<'a>(
            &'a self,
            _event: &'a Event,
            _kind: &'a EventKind,
            _scope: Scope<'a>,
        ) -> ExtractResult<Option<BoxedChecker<'a>>> {
            panic!("extractor bug");
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Matched<'_>) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move |_: &Matched<'_>| {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn message(text: &str) -> Event {
        Event::new(json!({ "text": text }))
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let err = dispatcher.register("text", Exploding).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateExtractorName("text".into()));

        let (count, handler) = counter();
        dispatcher.bind("text").unwrap().add("hi", handler);
        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert!(report.is_clean());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_unknown_name() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher.bind("nope").err().unwrap();
        assert_eq!(err, RegistryError::UnknownExtractorName("nope".into()));
    }

    #[test]
    fn test_kind_scoped_extractor_not_activated_for_other_kinds() {
        let extractor = TextLike::new(vec!["message"]);
        let activations = Arc::clone(&extractor.activations);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register("text", extractor).unwrap();
        let (count, handler) = counter();
        dispatcher.bind("text").unwrap().add("hi", handler);

        let report = dispatcher.dispatch(&message("hi"), &EventKind::CallbackQuery);

        assert_eq!(report.activated, 0);
        assert_eq!(activations.load(Ordering::SeqCst), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_extractor_without_routes_is_not_activated() {
        let extractor = TextLike::new(vec!["message"]);
        let activations = Arc::clone(&extractor.activations);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register("text", extractor).unwrap();
        dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_any_kind_bucket_runs_for_unknown_kinds() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("anywhere", TextLike::new(vec![])).unwrap();
        let (count, handler) = counter();
        dispatcher.bind("anywhere").unwrap().add("hi", handler);

        dispatcher.dispatch(&message("hi"), &EventKind::from("poll_answer"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_routes_fire_in_insertion_order() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (first, second, third) = (Arc::clone(&order), Arc::clone(&order), Arc::clone(&order));
        dispatcher
            .bind("text")
            .unwrap()
            .add(Pattern::regex("^h").unwrap(), move |_: &Matched<'_>| {
                first.lock().push(1)
            })
            .add("nope", move |_: &Matched<'_>| second.lock().push(2))
            .add("hi", move |_: &Matched<'_>| third.lock().push(3));

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(report.fired, 2);
        assert_eq!(*order.lock(), vec![1, 3]);
    }

    #[test]
    fn test_failing_handler_does_not_block_sibling() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let (count, handler) = counter();
        dispatcher
            .bind("text")
            .unwrap()
            .add("hi", |_: &Matched<'_>| {
                Err::<(), _>(std::io::Error::other("send failed"))
            })
            .add(Pattern::regex("i$").unwrap(), handler);

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(report.fired, 1);
        assert!(matches!(
            report.errors.as_slice(),
            [EventProcessingError::Handler { index: 0, .. }]
        ));
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let (count, handler) = counter();
        dispatcher
            .bind("text")
            .unwrap()
            .add("hi", |m: &Matched<'_>| {
                if m.text(0) == Some("hi") {
                    panic!("handler bug");
                }
            })
            .add("hi", handler);

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            &report.errors[0],
            EventProcessingError::Panic { stage: "handler", message, .. } if message == "handler bug"
        ));
    }

    #[test]
    fn test_failing_extractors_do_not_stop_others() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("broken", Exploding).unwrap();
        dispatcher.register("buggy", Panicking).unwrap();
        dispatcher.register("text", TextLike::new(vec![])).unwrap();

        let (count, handler) = counter();
        dispatcher
            .bind("broken")
            .unwrap()
            .add("hi", |_: &Matched<'_>| {})
            .bind("buggy")
            .unwrap()
            .add("hi", |_: &Matched<'_>| {})
            .bind("text")
            .unwrap()
            .add("hi", handler);

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].extractor(), "broken");
        assert_eq!(report.errors[1].extractor(), "buggy");
    }

    #[test]
    fn test_unsupported_pattern_is_reported_not_fatal() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let (count, handler) = counter();
        dispatcher
            .bind("text")
            .unwrap()
            .add(7_i64, |_: &Matched<'_>| {})
            .add("hi", handler);

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        match &report.errors[..] {
            [EventProcessingError::Pattern { source, .. }] => {
                assert_eq!(*source, PatternError::unsupported("number"));
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn test_handler_may_register_during_dispatch() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();
        let dispatcher = Arc::new(dispatcher);

        let inner = Arc::clone(&dispatcher);
        dispatcher
            .bind("text")
            .unwrap()
            .add("hi", move |_: &Matched<'_>| {
                inner
                    .bind("text")
                    .map(|r| {
                        r.add("later", |_: &Matched<'_>| {});
                    })
                    .map_err(|e| e.to_string())
            });

        let report = dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert!(report.is_clean());
        assert_eq!(dispatcher.route_count("text"), 2);
    }

    #[test]
    fn test_matched_carries_extractor_values() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register("text", TextLike::new(vec!["message"]))
            .unwrap();

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = Arc::clone(&seen);
        dispatcher
            .bind("text")
            .unwrap()
            .add("hi", move |m: &Matched<'_>| {
                *sink.lock() = Some((
                    m.extractor.to_string(),
                    m.kind.clone(),
                    m.text(0).map(str::to_owned),
                ));
            });

        dispatcher.dispatch(&message("hi"), &EventKind::Message);

        assert_eq!(
            *seen.lock(),
            Some(("text".to_string(), EventKind::Message, Some("hi".to_string())))
        );
    }
}
