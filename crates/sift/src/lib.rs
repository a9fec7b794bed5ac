//! # Sift
//!
//! A pattern-matching event router for chat-bot updates.
//!
//! ## Overview
//!
//! Sift routes incoming updates to handlers. Each registered *extractor*
//! looks at an event once, and its checker then answers, pattern by pattern,
//! whether the event matches and with which values the handler should run.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌───────────────────────────┐
//! │  Runtime  │────▶│ Dispatcher │────▶│ "text"       ──▶ routes   │──▶ handlers
//! │ (stream)  │     │ (by kind)  │────▶│ "similarity" ──▶ routes   │──▶ handlers
//! └───────────┘     └────────────┘────▶│ "all"/"any"  ──▶ routes   │──▶ handlers
//!                                      └───────────────────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, drains the update stream
//! - **Dispatcher**: indexes extractors by event kind and fans each event out
//! - **Extractors**: built-in (`sift-extractors`) or user-defined
//! - **Routes**: insertion-ordered `(pattern, handler)` pairs per extractor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Runtime::builder().build()?;
//!
//!     runtime
//!         .dispatcher()
//!         .bind("command")?
//!         .add("/ping", |_: &Matched<'_>| info!("pong"))
//!         .bind("similarity")?
//!         .add("good morning", |m: &Matched<'_>| info!(score = m.score(), "greeting"));
//!
//!     runtime.run_until_signal(updates).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `sift.toml` configuration files (default)
//! - `yaml-config`: `sift.yaml` configuration files
//! - `json-log`: newline-delimited JSON log output

pub use sift_core as core;
pub use sift_extractors as extractors;
pub use sift_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use sift::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use sift_runtime::{Runtime, RuntimeStats};

    // Routing
    pub use sift_core::prelude::*;
    pub use sift_extractors::{names, register_standard};

    // Logging macros for handlers
    pub use sift_runtime::prelude::*;
}
