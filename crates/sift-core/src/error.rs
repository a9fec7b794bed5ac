//! Unified error types for the Sift core.
//!
//! Errors fall into two groups:
//!
//! - **Setup-time** errors ([`RegistryError`]) are returned synchronously to
//!   whoever is registering extractors or patterns.
//! - **Dispatch-time** errors ([`EventProcessingError`]) are caught inside
//!   [`Dispatcher::dispatch`](crate::Dispatcher::dispatch), logged, and
//!   collected into the [`DispatchReport`](crate::DispatchReport). They never
//!   propagate out of a dispatch call.

use thiserror::Error;

/// A boxed error type for handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while wiring extractors and patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An extractor with this name is already registered.
    #[error("extractor '{0}' is already registered")]
    DuplicateExtractorName(String),

    /// No extractor with this name has been registered.
    #[error("unknown extractor '{0}'")]
    UnknownExtractorName(String),
}

// =============================================================================
// Pattern Errors
// =============================================================================

/// A pattern that cannot be evaluated by the extractor it was bound to.
///
/// These degrade the affected route (or composite branch) to "no match";
/// they never abort a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A composite pattern names an extractor that does not exist.
    #[error("composite pattern references unknown extractor '{0}'")]
    UnknownExtractor(String),

    /// The extractor has no interpretation for this kind of pattern.
    #[error("{kind} patterns are not supported here")]
    Unsupported {
        /// Short name of the pattern variant.
        kind: &'static str,
    },

    /// Composite patterns nested deeper than the configured bound.
    #[error("composite nesting exceeds depth limit of {limit}")]
    DepthExceeded {
        /// The configured depth limit.
        limit: usize,
    },
}

impl PatternError {
    /// Creates an unsupported-pattern error for the given variant name.
    pub fn unsupported(kind: &'static str) -> Self {
        Self::Unsupported { kind }
    }
}

// =============================================================================
// Extract Errors
// =============================================================================

/// Errors raised by an extractor while activating on an event.
///
/// Missing fields are not errors (the extractor simply does not apply);
/// this is reserved for data that is present but cannot be interpreted.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event carries a field the extractor cannot interpret.
    #[error("malformed event field '{field}': {reason}")]
    MalformedEvent {
        /// Name of the offending field.
        field: &'static str,
        /// Why it could not be interpreted.
        reason: String,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a malformed-field error.
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// A recoverable failure observed while dispatching one event.
#[derive(Debug, Error)]
pub enum EventProcessingError {
    /// The extractor returned an error from `activate`.
    #[error("extractor '{extractor}' failed to activate: {source}")]
    Activation {
        /// Registered extractor name.
        extractor: String,
        /// Underlying failure.
        #[source]
        source: ExtractError,
    },

    /// A registered pattern could not be evaluated.
    #[error("pattern #{index} of extractor '{extractor}' is malformed: {source}")]
    Pattern {
        /// Registered extractor name.
        extractor: String,
        /// Position of the route in the extractor's registration list.
        index: usize,
        /// Underlying failure.
        #[source]
        source: PatternError,
    },

    /// A handler returned an error.
    #[error("handler #{index} of extractor '{extractor}' failed: {source}")]
    Handler {
        /// Registered extractor name.
        extractor: String,
        /// Position of the route in the extractor's registration list.
        index: usize,
        /// Error returned by the handler.
        #[source]
        source: BoxError,
    },

    /// Extractor or handler code panicked.
    #[error("extractor '{extractor}' panicked during {stage}: {message}")]
    Panic {
        /// Registered extractor name.
        extractor: String,
        /// Which step was running ("activation", "pattern test" or "handler").
        stage: &'static str,
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl EventProcessingError {
    /// Returns the name of the extractor the failure belongs to.
    pub fn extractor(&self) -> &str {
        match self {
            Self::Activation { extractor, .. }
            | Self::Pattern { extractor, .. }
            | Self::Handler { extractor, .. }
            | Self::Panic { extractor, .. } => extractor,
        }
    }

    /// Returns `true` for malformed-pattern failures.
    pub fn is_malformed_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }
}

// =============================================================================
// Update Errors
// =============================================================================

/// Errors that can occur while parsing a raw transport update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The payload is not valid JSON.
    #[error("failed to parse update: {0}")]
    Json(#[from] serde_json::Error),

    /// The update is not a JSON object.
    #[error("update is not a JSON object")]
    NotAnObject,

    /// No event payload was found next to `update_id`.
    #[error("update carries no event payload")]
    MissingPayload,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for extractor activation.
pub type ExtractResult<T> = Result<T, ExtractError>;
