//! Runtime error types.

use sift_core::RegistryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while setting up or running a [`Runtime`](crate::Runtime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extractor registration failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Shutdown signal handlers could not be installed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
