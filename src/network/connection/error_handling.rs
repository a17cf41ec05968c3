//! Error handling utilities for connection management.
//!
//! Classifies transport read errors and turns dispatch errors into either a
//! private client reply or a log line.

use crate::error::ChatError;
use crate::handlers::Context;
use tokio_util::codec::LinesCodecError;
use tracing::{debug, warn};

/// Classification of transport read errors for appropriate handling.
pub(super) enum ReadErrorAction {
    /// Report to the client and keep reading.
    Recoverable(ChatError),
    /// The transport is unusable; end the session.
    Disconnect(ChatError),
}

/// Classify a line decoder error into an actionable category.
pub(super) fn classify_read_error(e: LinesCodecError, max_line_length: usize) -> ReadErrorAction {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            ReadErrorAction::Recoverable(ChatError::LineTooLong(max_line_length))
        }
        // Includes invalid UTF-8, which the codec surfaces as InvalidData.
        LinesCodecError::Io(io) => ReadErrorAction::Disconnect(ChatError::TransportRead(io)),
    }
}

/// Report a per-line failure without ending the session.
pub(super) async fn report_error(ctx: &Context<'_>, err: ChatError) {
    crate::metrics::record_command_error(err.error_code());

    if let Some(reply) = err.client_reply() {
        debug!(error = %err, "Reporting error to client");
        if let Err(e) = ctx.reply(reply).await {
            debug!(error = %e, "Could not deliver error reply");
        }
    } else if err.is_benign() {
        debug!(error = %err, "Ignoring benign session race");
    } else {
        warn!(error = %err, "Command failed");
    }
}
