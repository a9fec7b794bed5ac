//! Configuration module for the Sift runtime.
//!
//! This module provides layered configuration loading (defaults, files,
//! environment) and validation for logging, similarity matching and
//! dispatch settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SiftConfig, SpanEventConfig,
};
pub use validation::validate_config;
