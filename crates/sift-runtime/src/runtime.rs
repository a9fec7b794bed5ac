//! Update-stream runtime.
//!
//! A [`Runtime`] owns a configured [`Dispatcher`] and drains a stream of
//! [`Update`]s into it, one update at a time and in arrival order. It stops
//! when the stream ends or its [`CancellationToken`] is cancelled.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sift_runtime::Runtime;
//!
//! // sift.toml from the current directory, SIFT_* overrides, standard extractors
//! let runtime = Runtime::builder().build()?;
//!
//! runtime.dispatcher().bind("command")?.add("/start", start);
//!
//! runtime.run_until_signal(updates).await?;
//! ```

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use sift_core::{DispatchReport, Dispatcher, Update};
use sift_extractors::register_standard;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, info, span};

use crate::config::{ConfigLoader, SiftConfig};
use crate::error::RuntimeResult;
use crate::logging;

/// Counters accumulated over the lifetime of a [`Runtime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Updates dispatched.
    pub updates: u64,
    /// Handlers that ran to completion.
    pub handlers_fired: u64,
    /// Recoverable failures reported by the dispatcher.
    pub errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    updates: AtomicU64,
    handlers_fired: AtomicU64,
    errors: AtomicU64,
}

/// Drives a [`Dispatcher`] from an asynchronous stream of updates.
///
/// # Custom extractors
///
/// [`Runtime::from_config`] registers the standard extractors. To add your
/// own, build the dispatcher yourself and hand it over:
///
/// ```rust,ignore
/// let config = load_config()?;
/// let mut dispatcher = Dispatcher::new()
///     .with_depth_limit(config.dispatch.composite_depth_limit);
/// register_standard(&mut dispatcher, config.similarity)?;
/// dispatcher.register("weather", WeatherExtractor::new())?;
///
/// let runtime = Runtime::with_dispatcher(config, dispatcher);
/// ```
#[derive(Debug)]
pub struct Runtime {
    config: SiftConfig,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
    counters: Counters,
}

impl Runtime {
    /// Creates a runtime builder that loads configuration from files and
    /// environment.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already-loaded configuration.
    ///
    /// Initializes logging, then registers the standard extractors with the
    /// configured similarity options and depth limit.
    pub fn from_config(config: SiftConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let mut dispatcher =
            Dispatcher::new().with_depth_limit(config.dispatch.composite_depth_limit);
        register_standard(&mut dispatcher, config.similarity)?;

        info!(
            log_level = %config.logging.level,
            similarity_threshold = config.similarity.threshold,
            depth_limit = config.dispatch.composite_depth_limit,
            "Runtime initialized from configuration"
        );

        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Wraps a dispatcher that was set up by hand.
    ///
    /// Logging is not initialized here.
    pub fn with_dispatcher(config: SiftConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            shutdown: CancellationToken::new(),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// The shared dispatcher; bind patterns through it.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    ///
    /// Clones can be moved into handlers or other tasks.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests the runtime to stop after the current update.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            updates: self.counters.updates.load(Ordering::Relaxed),
            handlers_fired: self.counters.handlers_fired.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Dispatches a single update and records its outcome.
    pub fn handle(&self, update: &Update) -> DispatchReport {
        let span = span!(Level::DEBUG, "update", update_id = update.update_id);
        let _enter = span.enter();

        let report = self.dispatcher.dispatch(&update.event, &update.kind);

        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        self.counters
            .handlers_fired
            .fetch_add(report.fired as u64, Ordering::Relaxed);
        self.counters
            .errors
            .fetch_add(report.errors.len() as u64, Ordering::Relaxed);

        debug!(
            kind = %update.kind,
            activated = report.activated,
            fired = report.fired,
            errors = report.errors.len(),
            "Update handled"
        );
        report
    }

    /// Dispatches updates until the stream ends or shutdown is requested.
    ///
    /// A cancellation observed between two updates wins over a ready update.
    pub async fn run<S>(&self, updates: S) -> RuntimeStats
    where
        S: Stream<Item = Update>,
    {
        let mut updates = pin!(updates);
        info!("Runtime started");

        loop {
            let update = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, stopping");
                    break;
                }
                next = updates.next() => match next {
                    Some(update) => update,
                    None => {
                        info!("Update stream ended");
                        break;
                    }
                },
            };
            self.handle(&update);
        }

        let stats = self.stats();
        info!(
            updates = stats.updates,
            handlers_fired = stats.handlers_fired,
            errors = stats.errors,
            "Runtime stopped"
        );
        stats
    }

    /// Like [`run`](Self::run), but also stops on Ctrl+C or SIGTERM.
    pub async fn run_until_signal<S>(&self, updates: S) -> RuntimeResult<RuntimeStats>
    where
        S: Stream<Item = Update>,
    {
        tokio::select! {
            stats = self.run(updates) => Ok(stats),
            received = wait_for_shutdown() => {
                received?;
                self.shutdown.cancel();
                Ok(self.stats())
            }
        }
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder that loads configuration and creates a [`Runtime`].
///
/// ```rust,ignore
/// let runtime = Runtime::builder()
///     .config_file("config/sift.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Searches the current directory for configuration.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a full configuration over every other source.
    pub fn merge(mut self, config: SiftConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides a single configuration key.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    pub fn build(self) -> RuntimeResult<Runtime> {
        let config = self.config_loader.load()?;
        Runtime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
