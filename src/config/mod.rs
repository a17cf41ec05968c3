//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, ListenConfig, SessionConfig, LoggingConfig)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup sanity checks

mod defaults;
mod types;
mod validation;

pub use types::{
    Config, ConfigError, ListenConfig, LogFormat, LoggingConfig, ServerConfig, SessionConfig,
    SessionSettings,
};
pub use validation::{ValidationError, validate};
