//! Sift Runtime - configuration, logging and the update loop.
//!
//! This crate provides:
//! - Layered configuration (`sift.toml` / `sift.yaml`, `SIFT_*` environment
//!   variables, programmatic overrides) via [`config::ConfigLoader`]
//! - Logging setup over `tracing-subscriber` ([`LoggingBuilder`])
//! - A [`Runtime`] that drains an update stream into a dispatcher with the
//!   standard extractors registered
//!
//! # Example
//!
//! ```ignore
//! use sift_runtime::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Runtime::builder().build()?;
//!
//!     runtime
//!         .dispatcher()
//!         .bind("similarity")?
//!         .add("hello", |m: &Matched<'_>| info!(text = m.text(0), "greeting"));
//!
//!     runtime.run_until_signal(updates).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, SiftConfig, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by handler crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
