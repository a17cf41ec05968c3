//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("session.idle_timeout_secs must be greater than 0")]
    ZeroIdleTimeout,
    #[error("session.mailbox_capacity must be greater than 0")]
    ZeroMailboxCapacity,
    #[error("session.broadcast_capacity must be greater than 0")]
    ZeroBroadcastCapacity,
    #[error("session.max_line_length must be greater than 0")]
    ZeroMaxLineLength,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let session = &config.session;

    if session.idle_timeout_secs == 0 {
        errors.push(ValidationError::ZeroIdleTimeout);
    }
    // tokio's bounded mpsc panics on a zero capacity
    if session.mailbox_capacity == 0 {
        errors.push(ValidationError::ZeroMailboxCapacity);
    }
    if session.broadcast_capacity == 0 {
        errors.push(ValidationError::ZeroBroadcastCapacity);
    }
    if session.max_line_length == 0 {
        errors.push(ValidationError::ZeroMaxLineLength);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
