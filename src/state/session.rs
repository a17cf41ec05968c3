//! Per-connection session types.
//!
//! A session moves through a small one-way phase machine:
//!
//! ```text
//! ┌────────────┐  activate()  ┌──────────┐  begin_close()  ┌───────────┐  finish()  ┌──────────┐
//! │ Connecting ├─────────────►│  Active  ├────────────────►│  Closing  ├───────────►│  Closed  │
//! └─────┬──────┘              └──────────┘                 └───────────┘            └──────────┘
//!       │                      begin_close()                     ▲
//!       └────────────────────────────────────────────────────────┘
//! ```
//!
//! `begin_close()` succeeds exactly once per session. Whoever wins it owns the
//! teardown sequence; every other caller backs off.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Identity
// ============================================================================

/// Stable session key, derived from the remote endpoint at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Arc<str>);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<SocketAddr> for Identity {
    fn from(addr: SocketAddr) -> Self {
        Self::from(addr.to_string())
    }
}

// ============================================================================
// Mailbox
// ============================================================================

/// One outbound text line. Shared between every mailbox a broadcast lands in.
pub type Outbound = Arc<str>;

/// Producer side of a session's outbound queue.
pub type Mailbox = mpsc::Sender<Outbound>;

/// Consumer side of a session's outbound queue, owned by its writer.
pub type MailboxReceiver = mpsc::Receiver<Outbound>;

/// Create a bounded mailbox.
pub fn mailbox(capacity: usize) -> (Mailbox, MailboxReceiver) {
    mpsc::channel(capacity)
}

// ============================================================================
// Session
// ============================================================================

/// A registered session, as stored in the registry.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub display_name: String,
    pub mailbox: Mailbox,
}

impl Session {
    /// New session whose display name starts out equal to its identity.
    pub fn new(identity: Identity, mailbox: Mailbox) -> Self {
        let display_name = identity.to_string();
        Self {
            identity,
            display_name,
            mailbox,
        }
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            identity: self.identity.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Immutable (identity, display name) pair handed out by registry snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub identity: Identity,
    pub display_name: String,
}

impl SessionInfo {
    /// One line of a `\who` listing.
    pub fn listing_line(&self) -> String {
        format!("userid:{},username:{}", self.identity, self.display_name)
    }
}

// ============================================================================
// Presence notices
// ============================================================================

/// Why a session left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureReason {
    /// Remote closed the transport or the read failed.
    Exited,
    /// No input within the idle timeout.
    TimedOut,
}

impl DepartureReason {
    /// Static label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Exited => "exited",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for DepartureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited => f.write_str("exited"),
            Self::TimedOut => f.write_str("timed out exit"),
        }
    }
}

/// Lifecycle event broadcast to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    LoggedIn,
    Departed(DepartureReason),
}

impl Presence {
    /// Render as `<identity>:<displayName> <event>`.
    pub fn notice(self, identity: &Identity, display_name: &str) -> String {
        format!("{identity}:{display_name} {self}")
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedIn => f.write_str("logged in"),
            Self::Departed(reason) => fmt::Display::fmt(reason, f),
        }
    }
}

// ============================================================================
// Phase machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionPhase {
    Connecting = 0,
    Active = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Signals shared by the reader, writer and watchdog of one session.
#[derive(Debug)]
pub struct SessionControl {
    phase: AtomicU8,
    reset: Notify,
    cancel: CancellationToken,
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(SessionPhase::Connecting as u8),
            reset: Notify::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// `Connecting -> Active`. Fails if teardown already started.
    pub fn activate(&self) -> bool {
        self.phase
            .compare_exchange(
                SessionPhase::Connecting as u8,
                SessionPhase::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Enter `Closing`. Returns `true` for exactly one caller per session.
    pub fn begin_close(&self) -> bool {
        let mut current = self.phase.load(Ordering::Acquire);
        loop {
            if current >= SessionPhase::Closing as u8 {
                return false;
            }
            match self.phase.compare_exchange_weak(
                current,
                SessionPhase::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Terminal transition, once every task of the session has stopped.
    pub fn finish(&self) {
        self.phase
            .store(SessionPhase::Closed as u8, Ordering::Release);
    }

    /// Restart the idle timer. Never blocks; repeated calls coalesce.
    pub fn touch(&self) {
        self.reset.notify_one();
    }

    /// Resolves on the next `touch()` (or immediately if one is pending).
    pub async fn reset_requested(&self) {
        self.reset.notified().await;
    }

    /// Stop the reader and writer of this session.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
