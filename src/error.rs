//! Unified error handling for huddle.
//!
//! Every error in this hierarchy is scoped to a single session: none of them
//! is allowed to take the whole server down. The connection loop decides per
//! variant whether to report, log, or tear the session down.

use crate::state::Identity;
use thiserror::Error;

// ============================================================================
// Session Errors (registry, routing, dispatch)
// ============================================================================

/// Errors raised while serving a chat session.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("identity already registered: {0}")]
    DuplicateIdentity(Identity),

    #[error("no such session: {0}")]
    NotFound(Identity),

    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("mailbox full for {0}")]
    MailboxFull(Identity),

    #[error("mailbox closed for {0}")]
    MailboxClosed(Identity),

    #[error("broadcast channel closed")]
    BroadcastClosed,

    #[error("line too long (max {0} bytes)")]
    LineTooLong(usize),

    #[error("transport read error: {0}")]
    TransportRead(#[from] std::io::Error),
}

impl ChatError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateIdentity(_) => "duplicate_identity",
            Self::NotFound(_) => "not_found",
            Self::MalformedCommand(_) => "malformed_command",
            Self::MailboxFull(_) => "mailbox_full",
            Self::MailboxClosed(_) => "mailbox_closed",
            Self::BroadcastClosed => "broadcast_closed",
            Self::LineTooLong(_) => "line_too_long",
            Self::TransportRead(_) => "transport_read",
        }
    }

    /// Races between concurrent teardown paths. Logged, never surfaced.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentity(_) | Self::NotFound(_) | Self::MailboxClosed(_)
        )
    }

    /// Text sent back to the requesting client, if the error warrants one.
    ///
    /// Only errors caused by the client's own input are reported; internal
    /// failures stay in the logs.
    pub fn client_reply(&self) -> Option<String> {
        match self {
            Self::MalformedCommand(_) | Self::LineTooLong(_) => Some(format!("error: {self}")),
            _ => None,
        }
    }
}

/// Result type for session operations.
pub type ChatResult<T = ()> = Result<T, ChatError>;
