//! Handler system for the Sift router.
//!
//! Handlers are plain closures taking a [`Matched`] and returning either
//! `()` or a `Result<(), E>`. They run synchronously inside
//! [`Dispatcher::dispatch`](crate::Dispatcher::dispatch); anything slow
//! (sending a reply, say) should be spawned onto the caller's runtime.
//!
//! ```rust,ignore
//! dispatcher
//!     .bind("text")?
//!     .add("ping", |m: &Matched<'_>| info!(chat = ?m.event.chat_id(), "pong"))
//!     .add(Pattern::regex("^/fail")?, |_: &Matched<'_>| {
//!         Err::<(), _>(std::io::Error::other("nope"))
//!     });
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BoxError;
use crate::event::{Event, EventKind};
use crate::extractor::Captures;

// ============================================================================
// Matched
// ============================================================================

/// Everything a handler receives when its pattern matches.
#[derive(Debug)]
pub struct Matched<'a> {
    /// The event being dispatched.
    pub event: &'a Event,
    /// Its kind.
    pub kind: &'a EventKind,
    /// Registered name of the extractor that matched.
    pub extractor: &'a str,
    /// Extractor-specific values (text, score, chat id, ...).
    pub values: Captures,
}

impl Matched<'_> {
    /// Returns the value at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the value at `index` as a string.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(Value::as_str)
    }

    /// Returns the value at `index` as an integer.
    pub fn number(&self, index: usize) -> Option<i64> {
        self.value(index).and_then(Value::as_i64)
    }

    /// Returns the similarity score reported by the similarity extractor.
    pub fn score(&self) -> Option<f64> {
        self.value(1).and_then(Value::as_f64)
    }
}

// ============================================================================
// HandlerOutput
// ============================================================================

/// Return types accepted from handlers.
pub trait HandlerOutput {
    /// Converts the handler's return value into a result.
    fn into_result(self) -> Result<(), BoxError>;
}

impl HandlerOutput for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Type-erased handlers
// ============================================================================

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Runs the handler.
    fn call(&self, matched: &Matched<'_>) -> Result<(), BoxError>;
}

/// A type-erased handler that can be stored in route tables.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Wraps a closure so it can be stored as a [`BoxedHandler`].
pub struct HandlerFn<F, R> {
    f: F,
    _marker: PhantomData<fn() -> R>,
}

impl<F, R> HandlerFn<F, R> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, R> ErasedHandler for HandlerFn<F, R>
where
    F: Fn(&Matched<'_>) -> R + Send + Sync,
    R: HandlerOutput,
{
    fn call(&self, matched: &Matched<'_>) -> Result<(), BoxError> {
        (self.f)(matched).into_result()
    }
}

/// Converts a closure into a [`BoxedHandler`].
pub fn into_handler<F, R>(f: F) -> BoxedHandler
where
    F: Fn(&Matched<'_>) -> R + Send + Sync + 'static,
    R: HandlerOutput + 'static,
{
    Arc::new(HandlerFn::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matched<'a>(event: &'a Event, kind: &'a EventKind, values: Captures) -> Matched<'a> {
        Matched {
            event,
            kind,
            extractor: "similarity",
            values,
        }
    }

    #[test]
    fn test_accessors() {
        let event = Event::new(json!({}));
        let kind = EventKind::Message;
        let m = matched(&event, &kind, vec![json!("hello"), json!(0.8), json!(42)]);

        assert_eq!(m.text(0), Some("hello"));
        assert_eq!(m.score(), Some(0.8));
        assert_eq!(m.number(2), Some(42));
        assert_eq!(m.value(3), None);
    }

    #[test]
    fn test_unit_and_result_handlers() {
        let event = Event::new(json!({}));
        let kind = EventKind::Message;
        let m = matched(&event, &kind, Vec::new());

        let ok = into_handler(|_: &Matched<'_>| {});
        assert!(ok.call(&m).is_ok());

        let failing = into_handler(|_: &Matched<'_>| Err::<(), _>(std::io::Error::other("boom")));
        let err = failing.call(&m).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
