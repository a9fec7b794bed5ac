//! # Sift Core
//!
//! The core engine of the Sift event router.
//!
//! This crate provides the building blocks every Sift extractor and
//! application is written against: the event model, the pattern union, the
//! extractor protocol and the central dispatcher.
//!
//! ## Overview
//!
//! - **Event model**: read-only JSON events and their kinds ([`Event`], [`EventKind`], [`Update`])
//! - **Patterns**: the closed pattern union callers register ([`Pattern`])
//! - **Extractor protocol**: how a value is pulled from an event and tested
//!   ([`Extractor`], [`Checker`], [`Scope`])
//! - **Dispatcher**: extractor registry, route table and event routing
//!   ([`Dispatcher`], [`Registrar`], [`DispatchReport`])
//! - **Similarity**: Levenshtein-based scoring ([`similarity`], [`SimilarityOptions`])
//!
//! ## Dispatch flow
//!
//! ```text
//! ┌──────────┐     ┌────────────┐  activate  ┌───────────┐  test  ┌─────────┐
//! │  Update  │────▶│ Dispatcher │───────────▶│ Extractor │───────▶│ Handler │
//! └──────────┘     └────────────┘            └───────────┘        └─────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sift_core::{Dispatcher, Matched, Pattern, Update};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("text", TextExtractor)?;
//!
//! dispatcher
//!     .bind("text")?
//!     .add(Pattern::regex("(?i)^hello")?, |m: &Matched<'_>| {
//!         println!("greeted in chat {:?}", m.event.chat_id());
//!     });
//!
//! let update = Update::from_json(raw)?;
//! let report = dispatcher.dispatch(&update.event, &update.kind);
//! assert!(report.is_clean());
//! ```

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod extractor;
pub mod handler;
pub mod pattern;
pub mod similarity;

pub use dispatcher::{DEFAULT_DEPTH_LIMIT, DispatchReport, Dispatcher, Registrar};
pub use error::{
    BoxError, EventProcessingError, ExtractError, ExtractResult, PatternError, RegistryError,
    RegistryResult, UpdateError,
};
pub use event::{Event, EventKind, MessageEntity, Update};
pub use extractor::{
    BoxedChecker, BoxedExtractor, Captures, CheckResult, Checker, Extractor, ExtractorTable,
    Scope, Subscription, checker,
};
pub use handler::{BoxedHandler, ErasedHandler, HandlerFn, HandlerOutput, Matched, into_handler};
pub use pattern::{Pattern, PatternItem, Predicate};
pub use similarity::{SimilarityOptions, SimilarityOverrides, levenshtein, similarity};

/// Prelude for common imports.
pub mod prelude {
    pub use super::dispatcher::{DispatchReport, Dispatcher};
    pub use super::error::{ExtractError, ExtractResult, PatternError, RegistryError};
    pub use super::event::{Event, EventKind, Update};
    pub use super::extractor::{BoxedChecker, Extractor, Scope, Subscription, checker};
    pub use super::handler::Matched;
    pub use super::pattern::Pattern;
    pub use super::similarity::{SimilarityOptions, SimilarityOverrides};
}
